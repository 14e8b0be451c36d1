pub mod audit;
pub mod cleanup;
pub mod error;
pub mod extensions;
pub mod library_config;
pub mod metadata;
pub mod scanner;
pub mod storage;
pub mod traits;

use std::{path::Path, time::Instant};

use indicatif::ProgressBar;
use tracing::info;

pub use crate::{
    audit::{AuditReport, AuditWarning},
    cleanup::CleanupReport,
    error::{ConfigError, LibraryError, Result, TagError},
    extensions::SupportedExtension,
    library_config::{DatabaseBackend, LibraryConfig, LibraryConfigBuilder},
    metadata::{LoftyReader, ReaderRegistry, UnreadableContainer},
    scanner::{LocalScanner, ScanStats},
    storage::{CrossReferenceCounts, LocalStorage, ReleaseTrack, TableCounts},
    traits::{RecordingStore, TagReader},
};

/// Ties the index, the tag readers and the settings together for one run.
#[derive(Debug)]
pub struct LibraryManager {
    storage: LocalStorage,
    readers: ReaderRegistry,
    config: LibraryConfig,
}

impl LibraryManager {
    /// Opens the existing index named by `config`.
    pub fn open(config: LibraryConfig) -> Result<Self> {
        let storage = match &config.database {
            DatabaseBackend::Sqlite(path) => LocalStorage::open(path)?,
        };
        Ok(Self::with_storage(storage, config))
    }

    /// Creates the index named by `config`, or upgrades its schema.
    pub fn create(config: LibraryConfig) -> Result<Self> {
        let storage = match &config.database {
            DatabaseBackend::Sqlite(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                LocalStorage::create(path)?
            }
        };
        Ok(Self::with_storage(storage, config))
    }

    pub fn with_storage(storage: LocalStorage, config: LibraryConfig) -> Self {
        LibraryManager {
            storage,
            readers: ReaderRegistry::with_defaults(),
            config,
        }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn scan(&self, dir: impl AsRef<Path>, progress: ProgressBar) -> Result<ScanStats> {
        let start_time = Instant::now();
        let stats = LocalScanner::new(&self.storage, &self.readers)
            .follow_symlinks(self.config.follow_symlinks)
            .with_progress(progress)
            .scan(dir)?;
        info!("Scan took {} ms", start_time.elapsed().as_millis());
        Ok(stats)
    }

    pub fn cleanup(&self, dry_run: bool) -> Result<CleanupReport> {
        cleanup::sweep(&self.storage, dry_run)
    }

    pub fn audit(&self, include_remote: bool) -> Result<AuditReport> {
        audit::audit(&self.storage, include_remote)
    }
}
