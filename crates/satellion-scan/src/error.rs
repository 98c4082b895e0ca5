//! Error types for balance scanning

use satellion_core::ErrorKind;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Chain collaborator failed or is not running
    #[error("Chain unavailable: {0}")]
    ChainUnavailable(String),

    /// Wallet cannot be scanned in its current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed compact filter
    #[error("Filter error: {0}")]
    Filter(String),

    /// Operation cancelled
    #[error("Cancelled")]
    Cancelled,

    /// Background task failed to complete
    #[error("Task error: {0}")]
    Task(String),

    /// Wallet core error
    #[error(transparent)]
    Core(#[from] satellion_core::Error),
}

impl Error {
    /// Map onto the shared error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ChainUnavailable(_) | Error::Filter(_) => ErrorKind::ChainUnavailable,
            Error::InvalidState(_) | Error::Cancelled | Error::Task(_) => ErrorKind::InvalidState,
            Error::Core(e) => e.kind(),
        }
    }

    /// True for a cancelled scan
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub(crate) fn chain(context: &str, err: anyhow::Error) -> Self {
        Error::ChainUnavailable(format!("{}: {:#}", context, err))
    }
}
