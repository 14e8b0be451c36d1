use std::path::Path;

use resolver_core::RecordingId;
use tracing::{debug, info};

use crate::error::Result;
use crate::traits::RecordingStore;

/// What a sweep found and did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanupReport {
    /// Recordings whose file is gone, in index order.
    pub missing: Vec<(RecordingId, String)>,
    pub deleted: usize,
    pub dry_run: bool,
}

/// Drops index rows whose backing file no longer exists. With `dry_run` the
/// candidates are only reported.
pub fn sweep<S: RecordingStore + ?Sized>(store: &S, dry_run: bool) -> Result<CleanupReport> {
    let missing: Vec<(RecordingId, String)> = store
        .recording_paths()?
        .into_iter()
        .filter(|(_, file_path)| !Path::new(file_path).exists())
        .collect();

    for (_, file_path) in &missing {
        debug!("RM {file_path}");
    }

    if missing.is_empty() {
        info!("No cleanup needed, all recordings found");
        return Ok(CleanupReport { missing, deleted: 0, dry_run });
    }

    if dry_run {
        info!("--delete not specified, no references removed");
        return Ok(CleanupReport { missing, deleted: 0, dry_run });
    }

    let ids: Vec<RecordingId> = missing.iter().map(|(id, _)| *id).collect();
    let deleted = store.delete_recordings(&ids)?;
    info!("Stale references removed");

    Ok(CleanupReport { missing, deleted, dry_run })
}
