//! HD wallet with BIP86 taproot addresses
//!
//! A [`Wallet`] owns the master key derived once from its mnemonic and
//! passphrase, the next receive and change indices, and the lock that
//! authenticates the passphrase without storing it.

use crate::address::TaprootAddress;
use crate::keys::{AddressKind, RootKey};
use crate::mnemonic::Mnemonic;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use satellion_params::Network;
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex SHA-256 of raw seed bytes
pub fn seed_lock(seed: &[u8]) -> String {
    hex::encode(Sha256::digest(seed))
}

/// HD wallet
#[derive(Clone)]
pub struct Wallet {
    name: String,
    mnemonic: Mnemonic,
    root: RootKey,
    network: Network,
    next_change_index: u32,
    next_receive_index: u32,
    lock: String,
    created_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Build a wallet from its mnemonic and passphrase.
    ///
    /// When `lock` is `None` the lock is computed from this passphrase's seed,
    /// which is how a wallet is first created. A restored wallet passes its
    /// stored lock so that [`Wallet::verify_passphrase`] can detect a wrong passphrase.
    pub fn new(
        mnemonic: Mnemonic,
        passphrase: &str,
        name: impl Into<String>,
        next_change_index: u32,
        next_receive_index: u32,
        lock: Option<String>,
    ) -> Result<Self> {
        let seed = mnemonic.seed(passphrase);
        let root = RootKey::from_seed(seed.as_ref())?;
        let lock = lock.unwrap_or_else(|| seed_lock(seed.as_ref()));

        Ok(Self {
            name: name.into(),
            mnemonic,
            root,
            network: Network::mainnet(),
            next_change_index,
            next_receive_index,
            lock,
            created_at: None,
        })
    }

    /// Fresh wallet with zero indices, stamped with the current time
    pub fn create(mnemonic: Mnemonic, passphrase: &str, name: impl Into<String>) -> Result<Self> {
        let wallet = Self::new(mnemonic, passphrase, name, 0, 0, None)?;
        Ok(wallet.with_created_at(Utc::now()))
    }

    /// Set the creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Derive addresses for another network
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Wallet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the wallet
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Mnemonic the wallet was built from
    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    /// Network addresses are encoded for
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Next unused change index
    pub fn next_change_index(&self) -> u32 {
        self.next_change_index
    }

    /// Next unused receive index
    pub fn next_receive_index(&self) -> u32 {
        self.next_receive_index
    }

    /// Hex SHA-256 of the seed
    pub fn lock(&self) -> &str {
        &self.lock
    }

    /// Creation time, `None` for wallets restored without one
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Derive the address at `m/86'/coin'/0'/kind/index`
    pub fn address(&self, kind: AddressKind, index: u32) -> Result<TaprootAddress> {
        let pair = self
            .root
            .derive_bip86(self.network.coin_type, kind, index)?;
        TaprootAddress::from_key_pair(&self.network, kind, index, &pair)
    }

    /// Address at the current receive index
    pub fn receive_address(&self) -> Result<TaprootAddress> {
        self.address(AddressKind::Receive, self.next_receive_index)
    }

    /// Address at the current change index
    pub fn change_address(&self) -> Result<TaprootAddress> {
        self.address(AddressKind::Change, self.next_change_index)
    }

    /// Advance the receive index and derive there
    pub fn new_receive_address(&mut self) -> Result<TaprootAddress> {
        let index = next_index(self.next_receive_index)?;
        let address = self.address(AddressKind::Receive, index)?;
        self.next_receive_index = index;
        tracing::debug!("Advanced receive index of {} to {}", self.name, index);
        Ok(address)
    }

    /// Advance the change index and derive there
    pub fn new_change_address(&mut self) -> Result<TaprootAddress> {
        let index = next_index(self.next_change_index)?;
        let address = self.address(AddressKind::Change, index)?;
        self.next_change_index = index;
        tracing::debug!("Advanced change index of {} to {}", self.name, index);
        Ok(address)
    }

    /// Receive and change scriptPubKeys for indices `0..=max_index`, interleaved
    pub fn scripts(&self, max_index: u32) -> Result<Vec<Vec<u8>>> {
        let mut scripts = Vec::with_capacity((max_index as usize + 1) * 2);
        for index in 0..=max_index {
            scripts.push(self.address(AddressKind::Receive, index)?.script_pubkey());
            scripts.push(self.address(AddressKind::Change, index)?.script_pubkey());
        }
        Ok(scripts)
    }

    /// Check `passphrase` against the lock
    pub fn verify_passphrase(&self, passphrase: &str) -> Result<()> {
        let seed = self.mnemonic.seed(passphrase);
        if seed_lock(seed.as_ref()) == self.lock {
            Ok(())
        } else {
            Err(Error::InvalidPassphrase)
        }
    }
}

fn next_index(current: u32) -> Result<u32> {
    current
        .checked_add(1)
        .ok_or_else(|| Error::KeyDerivation("address index overflow".to_string()))
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("name", &self.name)
            .field("network", &self.network.name)
            .field("next_change_index", &self.next_change_index)
            .field("next_receive_index", &self.next_receive_index)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
