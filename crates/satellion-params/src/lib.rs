//! Bitcoin network parameters and constants
//!
//! Network-specific address prefixes, BIP44 coin types, taproot derivation
//! constants and the BIP158 basic filter parameters shared by the wallet crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod consensus;
pub mod network;

pub use consensus::{BIP86_PURPOSE, DEFAULT_ACCOUNT, FILTER_M, FILTER_P};
pub use network::{Network, NetworkType};

/// Error types for parameter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid network specified
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),
}

/// Result type for parameter operations
pub type Result<T> = std::result::Result<T, Error>;
