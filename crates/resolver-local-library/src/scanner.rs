use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use indicatif::ProgressBar;
use resolver_core::{NewRecording, UpsertOutcome};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::error::{LibraryError, Result, TagError};
use crate::extensions::{SupportedExtension, is_image};
use crate::metadata::ReaderRegistry;
use crate::traits::RecordingStore;

/// Width of each name column in the progress line; names are cut one short of it.
const NAME_COLUMN: usize = 30;

/// Tallies of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanStats {
    /// Files with a supported extension that were examined.
    pub total: u64,
    pub unchanged: u64,
    pub added: u64,
    pub updated: u64,
    pub error: u64,
    /// Files with an extension nobody reads.
    pub skipped: u64,
    pub images_ignored: u64,
}

impl ScanStats {
    /// Every examined file ended in exactly one outcome.
    pub fn is_consistent(&self) -> bool {
        self.unchanged + self.added + self.updated + self.error == self.total
    }
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Checked {} tracks:", self.total)?;
        writeln!(f, "  {:5} tracks not changed since last run", self.unchanged)?;
        writeln!(f, "  {:5} tracks added", self.added)?;
        writeln!(f, "  {:5} tracks updated", self.updated)?;
        write!(f, "  {:5} tracks could not be read", self.error)
    }
}

/// Result of visiting one supported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Unchanged,
    Added(String),
    Updated(String),
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("cannot stat file: {0}")]
    Stat(#[source] std::io::Error),

    #[error("Failed to read metadata from audio file: {0}")]
    Tags(#[from] TagError),

    #[error(transparent)]
    Store(#[from] LibraryError),
}

/// Walks a directory tree and keeps the index in step with it.
pub struct LocalScanner<'a, S: RecordingStore + ?Sized> {
    store: &'a S,
    readers: &'a ReaderRegistry,
    follow_symlinks: bool,
    progress: ProgressBar,
}

impl<'a, S: RecordingStore + ?Sized> LocalScanner<'a, S> {
    pub fn new(store: &'a S, readers: &'a ReaderRegistry) -> Self {
        LocalScanner {
            store,
            readers,
            follow_symlinks: true,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    #[instrument(level = "info", skip_all, fields(root = %root.as_ref().display()))]
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<ScanStats> {
        let root = dunce::canonicalize(root.as_ref())?;

        let audio_file_count = self.count_audio_files(&root)?;
        info!("Found {audio_file_count} audio files");
        self.progress.set_length(audio_file_count);

        let mut stats = ScanStats::default();
        for entry in self.walker(&root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };

            if entry.file_type().is_file() {
                self.visit(entry.path(), audio_file_count, &mut stats);
            }
        }
        self.progress.finish_and_clear();

        if !stats.is_consistent() {
            warn!(?stats, "And for some reason these numbers don't add up to the total.");
        }
        Ok(stats)
    }

    fn walker(&self, root: &Path) -> walkdir::IntoIter {
        WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
    }

    /// Dry run sizing the progress bar. Unreadable entries are ignored here;
    /// the real pass reports them.
    fn count_audio_files(&self, root: &Path) -> Result<u64> {
        let count = self
            .walker(root)
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| !is_image(entry.path()) && SupportedExtension::from_path(entry.path()).is_some())
            .count();
        Ok(count as u64)
    }

    fn visit(&self, path: &Path, audio_file_count: u64, stats: &mut ScanStats) {
        // Only files reach this point, so a directory named like an image is still walked.
        if is_image(path) {
            stats.images_ignored += 1;
            return;
        }

        let base = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let Some(ext) = SupportedExtension::from_path(path) else {
            stats.skipped += 1;
            self.report(format!("  unknown {base}"));
            return;
        };

        stats.total += 1;
        let pct = 100 * stats.total / audio_file_count.max(1);

        match self.process_file(path, ext, pct) {
            Ok(FileOutcome::Unchanged) => {
                stats.unchanged += 1;
                self.report(format!("unchanged {base}"));
            }
            Ok(FileOutcome::Added(details)) => {
                stats.added += 1;
                self.report(format!("      add {details}"));
            }
            Ok(FileOutcome::Updated(details)) => {
                stats.updated += 1;
                self.report(format!("   update {details}"));
            }
            Err(e) => {
                stats.error += 1;
                warn!(path = %path.display(), "{e}");
                self.report(format!("    error {base}: {e}"));
            }
        }
        self.progress.inc(1);
    }

    /// Decides whether the file is new, changed or untouched, and indexes it if needed.
    pub fn process_file(&self, path: &Path, ext: SupportedExtension, pct: u64) -> Result<FileOutcome, FileError> {
        let file_path = path.to_str().ok_or_else(|| FileError::NonUtf8Path(path.to_path_buf()))?;
        let mtime = file_mtime(path).map_err(FileError::Stat)?;

        if let Some(existing) = self.store.recording_by_path(file_path)? {
            if existing.mtime == mtime {
                return Ok(FileOutcome::Unchanged);
            }
        }

        let record = self.readers.read(ext, path)?.into_recording(file_path, mtime);
        let outcome = self.store.upsert_recording(&record)?;

        let details = progress_details(pct, &record);
        Ok(match outcome {
            UpsertOutcome::Added => FileOutcome::Added(details),
            UpsertOutcome::Updated => FileOutcome::Updated(details),
        })
    }

    fn report(&self, line: String) {
        debug!("{line}");
        self.progress.println(line);
    }
}

/// Modification time in whole Unix seconds.
fn file_mtime(path: &Path) -> std::io::Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    })
}

fn progress_details(pct: u64, record: &NewRecording) -> String {
    format!(
        " {pct}%  {:<w$} {:<w$} {:<w$}",
        truncate(&record.recording_name),
        truncate(&record.release_name),
        truncate(&record.artist_name),
        w = NAME_COLUMN,
    )
}

fn truncate(name: &str) -> String {
    name.chars().take(NAME_COLUMN - 1).collect()
}
