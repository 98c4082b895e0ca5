//! Storage configuration

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Secret used when the caller does not supply one.
///
/// This is at-rest obfuscation only: anyone holding this constant can open
/// the enclave. Callers that need real protection must pass their own secret.
pub const DEFAULT_ENCLAVE_SECRET: &str = "satellion-enclave-v1";

const ENCLAVE_DIR: &str = "enclave";
const WALLET_DB_FILE: &str = "wallets.db";

/// Where and how wallet state is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage root directory
    pub root: PathBuf,
    /// Secret hashed into the AES-256-GCM key
    pub enclave_secret: String,
}

impl StorageConfig {
    /// Config rooted at `root` with the default secret
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Directory holding enclave blobs
    pub fn enclave_dir(&self) -> PathBuf {
        self.root.join(ENCLAVE_DIR)
    }

    /// Path of the wallet database
    pub fn wallet_db_path(&self) -> PathBuf {
        self.root.join(WALLET_DB_FILE)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = ProjectDirs::from("org", "Satellion", "Satellion")
            .map(|dirs| dirs.data_local_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".satellion"));

        Self {
            root,
            enclave_secret: DEFAULT_ENCLAVE_SECRET.to_string(),
        }
    }
}
