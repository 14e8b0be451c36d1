//! Reconciles the local index with a Subsonic-compatible server and pushes
//! playlists to it.

pub mod catalog;
pub mod client;
pub mod error;
pub mod playlist;
pub mod sync;
pub mod types;

pub use catalog::RemoteCatalog;
pub use client::{SubsonicClient, SubsonicConfig};
pub use error::{Result, SyncError};
pub use playlist::{Jspf, upload_playlist};
pub use sync::{PAGE_SIZE, SyncReconciler, SyncStats};
pub use types::{AlbumInfo, RemoteAlbum, RemoteSong};
