use thiserror::Error;

/// Library error type for figure-rotator operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured figure library is missing or is not a directory.
    #[error("invalid figure library: {0}")]
    BadLibrary(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
