use serde::Deserialize;

/// One entry of the album listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteAlbum {
    pub id: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
}

impl RemoteAlbum {
    /// Album name, falling back to the directory title older servers send.
    pub fn name(&self) -> &str {
        self.album.as_deref().unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AlbumInfo {
    #[serde(rename = "musicBrainzId")]
    pub music_brainz_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteSong {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub track: Option<u32>,
    #[serde(rename = "discNumber")]
    pub disc_number: Option<u32>,
}

// --- Wire envelopes ---

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "subsonic-response")]
    pub response: Response<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Response<T> {
    pub status: String,
    pub error: Option<ApiError>,
    #[serde(flatten)]
    pub payload: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumListPayload {
    #[serde(rename = "albumList")]
    pub album_list: Option<AlbumList>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AlbumList {
    #[serde(default)]
    pub album: Vec<RemoteAlbum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumInfoPayload {
    #[serde(rename = "albumInfo")]
    pub album_info: Option<AlbumInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumPayload {
    pub album: Option<AlbumSongs>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumSongs {
    pub song: Option<Vec<RemoteSong>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistPayload {
    pub playlist: Option<serde_json::Value>,
}
