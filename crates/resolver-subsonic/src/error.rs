use resolver_local_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Subsonic error {code}: {message}")]
    Api { code: i32, message: String },

    #[error("response carried no `{0}` element")]
    MissingPayload(&'static str),

    #[error(transparent)]
    Store(#[from] LibraryError),

    #[error("invalid playlist: {0}")]
    InvalidPlaylist(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
