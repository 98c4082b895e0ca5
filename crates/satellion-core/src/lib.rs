//! Satellion wallet core
//!
//! Mnemonic handling, BIP32 key derivation, BIP86 taproot addresses and the
//! HD wallet model shared by the storage and scanning crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod wallet;

pub use address::{
    encode_taproot, parse_taproot_address, taproot_script, TaprootAddress, TAPROOT_SCRIPT_LEN,
};
pub use error::{Error, ErrorKind, Result};
pub use keys::{tagged_hash, taproot_output_key, AddressKind, KeyPair, RootKey};
pub use mnemonic::{is_word, Mnemonic, Seed, MNEMONIC_WORD_COUNT, SEED_LEN};
pub use satellion_params::{Network, NetworkType};
pub use wallet::{seed_lock, Wallet};
