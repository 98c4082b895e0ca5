//! Error types for Satellion Core
//!
//! Error taxonomy shared by the wallet crates. Every crate error maps onto an
//! [`ErrorKind`] so callers can branch on the kind regardless of which layer failed.

use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Satellion Core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong word count or a word outside the list
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Passphrase does not reproduce the stored lock
    #[error("Invalid passphrase")]
    InvalidPassphrase,

    /// BIP32 or BIP341 key derivation error
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Invalid address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Operation not valid for the current wallet state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Map onto the shared error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMnemonic(_) => ErrorKind::InvalidMnemonic,
            Error::InvalidPassphrase => ErrorKind::InvalidPassphrase,
            Error::KeyDerivation(_) | Error::InvalidAddress(_) => ErrorKind::DerivationFailure,
            Error::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        self.kind().is_user_error()
    }
}

/// Error kinds shared across the wallet crates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad word count or unknown word
    InvalidMnemonic,
    /// Lock mismatch
    InvalidPassphrase,
    /// Missing enclave key or wallet record
    NotFound,
    /// Cipher setup, seal/open failure, corrupt ciphertext
    CryptoFailure,
    /// BIP32/BIP341 key derivation error
    DerivationFailure,
    /// Chain collaborator call failed or chain not started
    ChainUnavailable,
    /// Operation not valid in the current state
    InvalidState,
    /// Entity marshal/unmarshal error
    SerializationFailure,
    /// Filesystem or database failure
    Storage,
}

impl ErrorKind {
    /// Errors caused by user input rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidMnemonic | ErrorKind::InvalidPassphrase | ErrorKind::NotFound
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidMnemonic => write!(f, "InvalidMnemonic"),
            ErrorKind::InvalidPassphrase => write!(f, "InvalidPassphrase"),
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::CryptoFailure => write!(f, "CryptoFailure"),
            ErrorKind::DerivationFailure => write!(f, "DerivationFailure"),
            ErrorKind::ChainUnavailable => write!(f, "ChainUnavailable"),
            ErrorKind::InvalidState => write!(f, "InvalidState"),
            ErrorKind::SerializationFailure => write!(f, "SerializationFailure"),
            ErrorKind::Storage => write!(f, "Storage"),
        }
    }
}

impl From<bip32::Error> for Error {
    fn from(e: bip32::Error) -> Self {
        Error::KeyDerivation(e.to_string())
    }
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Error::KeyDerivation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::InvalidMnemonic("test".to_string()).kind(),
            ErrorKind::InvalidMnemonic
        );
        assert_eq!(Error::InvalidPassphrase.kind(), ErrorKind::InvalidPassphrase);
        assert_eq!(
            Error::KeyDerivation("test".to_string()).kind(),
            ErrorKind::DerivationFailure
        );
        assert_eq!(
            Error::InvalidState("test".to_string()).kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_user_error_detection() {
        assert!(Error::InvalidPassphrase.is_user_error());
        assert!(Error::InvalidMnemonic("x".to_string()).is_user_error());
        assert!(!Error::KeyDerivation("x".to_string()).is_user_error());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::ChainUnavailable.to_string(), "ChainUnavailable");
        assert_eq!(ErrorKind::NotFound.to_string(), "NotFound");
    }
}
