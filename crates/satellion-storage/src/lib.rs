//! Encrypted local storage for Satellion wallets
//!
//! Provides the AES-256-GCM enclave blob store, the SQLite-backed wallet
//! repository with its active-wallet pointer, and the wallet use cases built
//! on top of them.
//!
//! ## Security Notes
//!
//! - **Enclave key**: SHA-256 of a construction-time secret. With the default
//!   secret this is obfuscation, not protection against someone holding the source.
//! - **Wallet records**: sealed with the same cipher before they reach SQLite.
//! - **Passphrases**: never persisted; the lock is a hash of the derived seed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod database;
pub mod enclave;
pub mod error;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod security;
pub mod service;

pub use config::{StorageConfig, DEFAULT_ENCLAVE_SECRET};
pub use database::Database;
pub use enclave::{blob_file_name, Enclave};
pub use error::{Error, Result};
pub use models::{WalletEntity, WalletInfo, WalletSummary};
pub use repository::WalletRepository;
pub use security::{hash_sha256, StoreKey, NONCE_LEN, TAG_LEN};
pub use service::WalletService;
