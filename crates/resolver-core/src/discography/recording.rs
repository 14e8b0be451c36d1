use std::time::Duration;

use uuid::Uuid;

use super::mbid::normalize_mbid;

pub type RecordingId = i64;

/// Tags extracted from one audio file, before they are tied to a path.
///
/// This is the whole contract a tag reader has to fulfil. Identifiers are
/// kept as the raw strings found in the file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagRecord {
    // --- Display names ---
    pub artist_name: String,
    pub release_name: String,
    pub recording_name: String,

    // --- MusicBrainz identifiers, unvalidated ---
    pub artist_mbid: Option<String>,
    pub release_mbid: Option<String>,
    pub recording_mbid: Option<String>,

    // --- Position and length ---
    pub duration: Option<Duration>,
    pub track_num: Option<u32>,
    pub disc_num: Option<u32>,
}

impl TagRecord {
    /// Stamps the file identity onto the tags and normalizes the identifiers.
    pub fn into_recording(self, file_path: impl Into<String>, mtime: i64) -> NewRecording {
        NewRecording {
            file_path: file_path.into(),
            artist_mbid: normalize_mbid(self.artist_mbid.as_deref()),
            release_mbid: normalize_mbid(self.release_mbid.as_deref()),
            recording_mbid: normalize_mbid(self.recording_mbid.as_deref()),
            artist_name: self.artist_name,
            release_name: self.release_name,
            recording_name: self.recording_name,
            mtime,
            duration: self.duration,
            track_num: self.track_num,
            disc_num: self.disc_num.unwrap_or(1),
        }
    }
}

/// Everything needed to insert a recording row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecording {
    /// Absolute path of the file; the unique key of the row.
    pub file_path: String,
    pub artist_name: String,
    pub release_name: String,
    pub recording_name: String,
    pub artist_mbid: Option<Uuid>,
    pub release_mbid: Option<Uuid>,
    pub recording_mbid: Option<Uuid>,
    /// Modification time of the file in Unix seconds.
    pub mtime: i64,
    pub duration: Option<Duration>,
    pub track_num: Option<u32>,
    pub disc_num: u32,
}

/// The columns rewritten when a known file changed on disk.
///
/// Carries no duration: an update keeps the duration stored at
/// insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingUpdate<'a> {
    pub artist_name: &'a str,
    pub release_name: &'a str,
    pub recording_name: &'a str,
    pub artist_mbid: Option<Uuid>,
    pub release_mbid: Option<Uuid>,
    pub recording_mbid: Option<Uuid>,
    pub mtime: i64,
    pub track_num: Option<u32>,
    pub disc_num: u32,
}

impl<'a> From<&'a NewRecording> for RecordingUpdate<'a> {
    fn from(rec: &'a NewRecording) -> Self {
        RecordingUpdate {
            artist_name: &rec.artist_name,
            release_name: &rec.release_name,
            recording_name: &rec.recording_name,
            artist_mbid: rec.artist_mbid,
            release_mbid: rec.release_mbid,
            recording_mbid: rec.recording_mbid,
            mtime: rec.mtime,
            track_num: rec.track_num,
            disc_num: rec.disc_num,
        }
    }
}

/// A recording row as persisted in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub id: RecordingId,
    pub file_path: String,
    pub artist_name: String,
    pub release_name: String,
    pub recording_name: String,
    pub artist_mbid: Option<Uuid>,
    pub release_mbid: Option<Uuid>,
    pub recording_mbid: Option<Uuid>,
    pub mtime: i64,
    pub duration: Option<Duration>,
    pub track_num: Option<u32>,
    pub disc_num: u32,
}

/// What an upsert did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Added => "added",
            UpsertOutcome::Updated => "updated",
        }
    }
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
