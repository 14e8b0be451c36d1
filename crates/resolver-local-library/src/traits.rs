use std::path::Path;

use resolver_core::{NewRecording, Recording, RecordingId, RemoteCrossReference, TagRecord, UpsertOutcome, Uuid};

use crate::error::{Result, TagError};
use crate::storage::{CrossReferenceCounts, ReleaseTrack, TableCounts};

/// Extracts tags from one container format.
pub trait TagReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<TagRecord, TagError>;
}

/// The persistence operations the scanner, the sweeper, the auditor and
/// the remote sync rely on.
pub trait RecordingStore {
    fn recording_by_path(&self, file_path: &str) -> Result<Option<Recording>>;

    /// Inserts the recording, or rewrites the row with the same `file_path`,
    /// as one transaction.
    fn upsert_recording(&self, recording: &NewRecording) -> Result<UpsertOutcome>;

    /// `(id, file_path)` of every recording.
    fn recording_paths(&self) -> Result<Vec<(RecordingId, String)>>;

    /// Deletes the given recordings; returns how many rows went away.
    fn delete_recordings(&self, ids: &[RecordingId]) -> Result<usize>;

    fn table_counts(&self) -> Result<TableCounts>;

    /// Local recordings of a release that carry a track number.
    fn release_tracks(&self, release_mbid: &Uuid) -> Result<Vec<ReleaseTrack>>;

    fn upsert_cross_references(&self, refs: &[RemoteCrossReference]) -> Result<CrossReferenceCounts>;
}
