use crate::error::Result;
use crate::types::{AlbumInfo, RemoteAlbum, RemoteSong};

/// The remote music server as seen by the sync and the playlist upload.
pub trait RemoteCatalog {
    /// One page of albums ordered by artist.
    fn album_list(&self, offset: usize, size: usize) -> Result<Vec<RemoteAlbum>>;

    fn album_info(&self, album_id: &str) -> Result<AlbumInfo>;

    /// `None` when the server returned the album without a song list.
    fn album_songs(&self, album_id: &str) -> Result<Option<Vec<RemoteSong>>>;

    fn create_playlist(&self, name: &str, song_ids: &[String]) -> Result<()>;
}
