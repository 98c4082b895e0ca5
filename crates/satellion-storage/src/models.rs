//! Persisted wallet records

use chrono::{DateTime, Utc};
use satellion_core::{Mnemonic, NetworkType, Wallet};
use satellion_params::Network;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Serialized shape of a [`Wallet`]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntity {
    /// Wallet name
    pub name: String,
    /// Mnemonic words in order
    pub mnemonic: Vec<String>,
    /// Next unused change index
    pub next_change_index: u32,
    /// Next unused receive index
    pub next_receive_index: u32,
    /// Hex SHA-256 of the seed
    pub lock: String,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Network addresses are encoded for
    #[serde(default)]
    pub network: NetworkType,
}

impl WalletEntity {
    /// Rebuild the wallet, keeping the stored lock
    pub fn to_wallet(&self, passphrase: &str) -> satellion_core::Result<Wallet> {
        let mnemonic = Mnemonic::from_words(&self.mnemonic)?;
        let mut wallet = Wallet::new(
            mnemonic,
            passphrase,
            self.name.clone(),
            self.next_change_index,
            self.next_receive_index,
            Some(self.lock.clone()),
        )?
        .with_network(Network::from_type(self.network));

        if let Some(created_at) = self.created_at {
            wallet = wallet.with_created_at(created_at);
        }
        Ok(wallet)
    }
}

impl From<&Wallet> for WalletEntity {
    fn from(wallet: &Wallet) -> Self {
        Self {
            name: wallet.name().to_string(),
            mnemonic: wallet.mnemonic().words().to_vec(),
            next_change_index: wallet.next_change_index(),
            next_receive_index: wallet.next_receive_index(),
            lock: wallet.lock().to_string(),
            created_at: wallet.created_at(),
            network: wallet.network().network_type,
        }
    }
}

impl std::fmt::Debug for WalletEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletEntity")
            .field("name", &self.name)
            .field("next_change_index", &self.next_change_index)
            .field("next_receive_index", &self.next_receive_index)
            .field("created_at", &self.created_at)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl Drop for WalletEntity {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
    }
}

/// Listing row, no key material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSummary {
    /// Wallet name
    pub name: String,
    /// True when this is the active wallet
    pub is_default: bool,
    /// Next unused change index
    pub next_change_index: u32,
    /// Next unused receive index
    pub next_receive_index: u32,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

impl WalletSummary {
    /// Highest of the two next indices
    pub fn next_index(&self) -> u32 {
        self.next_change_index.max(self.next_receive_index)
    }
}

/// Details shown for one wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletInfo {
    /// Wallet name
    pub name: String,
    /// True when this is the active wallet
    pub is_default: bool,
    /// Address at the current receive index
    pub receive_address: String,
    /// Next unused receive index
    pub next_receive_index: u32,
    /// Next unused change index
    pub next_change_index: u32,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}
