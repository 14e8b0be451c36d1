pub mod discography;

pub use discography::{
    cross_reference::RemoteCrossReference,
    mbid::normalize_mbid,
    recording::{NewRecording, Recording, RecordingId, RecordingUpdate, TagRecord, UpsertOutcome},
};
pub use uuid::Uuid;
