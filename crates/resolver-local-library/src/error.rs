use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Cannot open database index file: '{}'", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("The storage connection lock was poisoned")]
    LockPoisoned,
}

pub type Result<T, E = LibraryError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] config::ConfigError),
}

/// Why a tag reader could not produce a record for a file.
#[derive(Error, Debug)]
pub enum TagError {
    #[error("{0}")]
    Probe(#[from] lofty::error::LoftyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("the file carries no tags")]
    NoTag,

    #[error("no tag decoder available for .{0} files")]
    UnreadableContainer(String),
}
