pub mod cross_reference;
pub mod mbid;
pub mod recording;
