use std::path::PathBuf;

use thiserror::Error;

/// Library-wide error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("Not a store file: {}", .0.display())]
    NotAStore(PathBuf),

    #[error("Invalid store password")]
    WrongPassword,

    #[error("Collection not found: {0}")]
    UnknownCollection(String),

    #[error("Corrupt store: {0}")]
    Corrupt(String),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Background load failed: {0}")]
    Task(String),
}

impl Error {
    /// True for failures raised while reading a collection's contents, as
    /// opposed to failures of the open/validate step.
    pub fn is_storage_read(&self) -> bool {
        matches!(
            self,
            Error::UnknownCollection(_)
                | Error::Corrupt(_)
                | Error::Crypto(_)
                | Error::Io(_)
                | Error::Task(_)
        )
    }
}

/// Convenience Result type using our Error
pub type Result<T> = std::result::Result<T, Error>;
