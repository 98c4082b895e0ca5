//! Authenticated encryption for data at rest
//!
//! AES-256-GCM with a fresh random 12-byte nonce per message. Sealed output
//! is `nonce || ciphertext || tag`.

use crate::{Error, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// AES-GCM nonce length
pub const NONCE_LEN: usize = 12;

/// AES-GCM tag length
pub const TAG_LEN: usize = 16;

/// 256-bit storage key
#[derive(Clone)]
pub struct StoreKey {
    key: Zeroizing<[u8; 32]>,
}

impl StoreKey {
    /// SHA-256 of the secret
    pub fn from_secret(secret: &str) -> Self {
        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha256::digest(secret.as_bytes()));
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Create from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::Encryption("Invalid key length".to_string()));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);

        Ok(Self {
            key: Zeroizing::new(key),
        })
    }

    /// Encrypt under a fresh nonce
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(self.key.as_ref().into());

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt and authenticate
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::Encryption(format!(
                "Ciphertext too short: {} bytes",
                sealed.len()
            )));
        }

        let cipher = Aes256Gcm::new(self.key.as_ref().into());
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::Encryption("Authentication failed".to_string()))
    }
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreKey([REDACTED])")
    }
}

/// SHA-256 hex digest
pub fn hash_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
