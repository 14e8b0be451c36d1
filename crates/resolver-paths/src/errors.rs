use std::io;

/// Errors raised while resolving or preparing the application directories.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No usable base directory ($HOME, XDG, ...) could be determined.
    #[error(
        "Could not determine the project directory, the call to ProjectDirs failed, \
         the system probably does not provide a valid $HOME path."
    )]
    NoHome,

    /// I/O failure while creating or checking a directory.
    #[error(transparent)]
    Io(#[from] io::Error),
}
