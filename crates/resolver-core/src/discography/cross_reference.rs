use chrono::{DateTime, Utc};

use super::recording::RecordingId;

/// Links a local recording to the id the remote catalog uses for the same track.
///
/// A recording has at most one remote id; writing a new one replaces the old.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCrossReference {
    pub recording_id: RecordingId,
    pub remote_id: String,
    pub last_updated: DateTime<Utc>,
}

impl RemoteCrossReference {
    pub fn new(recording_id: RecordingId, remote_id: impl Into<String>) -> Self {
        RemoteCrossReference {
            recording_id,
            remote_id: remote_id.into(),
            last_updated: Utc::now(),
        }
    }
}
