//! Error types

use satellion_core::ErrorKind;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Encryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Wallet core error
    #[error(transparent)]
    Core(#[from] satellion_core::Error),
}

impl Error {
    /// Map onto the shared error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Encryption(_) => ErrorKind::CryptoFailure,
            Error::Serialization(_) => ErrorKind::SerializationFailure,
            Error::Validation(_) => ErrorKind::InvalidState,
            Error::Database(_) | Error::Migration(_) | Error::Io(_) => ErrorKind::Storage,
            Error::Core(e) => e.kind(),
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
