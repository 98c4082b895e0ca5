//! Wallet use cases on top of the repository

use crate::{Error, Result, WalletInfo, WalletRepository, WalletSummary};
use satellion_core::{Mnemonic, Wallet};

/// Create, import, switch and unlock wallets
pub struct WalletService {
    repo: WalletRepository,
}

impl WalletService {
    /// Create service
    pub fn new(repo: WalletRepository) -> Self {
        Self { repo }
    }

    /// Underlying repository
    pub fn repository(&self) -> &WalletRepository {
        &self.repo
    }

    /// Generate a BIP39 phrase and add a new wallet for it.
    ///
    /// The caller must show the returned wallet's mnemonic to the user; it is
    /// not retrievable without the repository afterwards.
    pub fn create_wallet(&self, name: &str, passphrase: &str) -> Result<Wallet> {
        let mnemonic = Mnemonic::generate_checksummed()?;
        self.add_wallet(name, mnemonic, passphrase)
    }

    /// Validate `phrase` and add a wallet for it
    pub fn import_wallet(&self, name: &str, phrase: &str, passphrase: &str) -> Result<Wallet> {
        let mnemonic = Mnemonic::parse(phrase)?;
        self.add_wallet(name, mnemonic, passphrase)
    }

    /// Add a wallet stamped with the current time
    pub fn add_wallet(&self, name: &str, mnemonic: Mnemonic, passphrase: &str) -> Result<Wallet> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("wallet name is required".to_string()));
        }
        if self.repo.get_entity(name).is_ok() {
            return Err(Error::Validation(format!("wallet {} already exists", name)));
        }

        let wallet = Wallet::create(mnemonic, passphrase, name)?;
        self.repo.add(&wallet)?;
        Ok(wallet)
    }

    /// Authenticate against the active wallet
    pub fn unlock(&self, passphrase: &str) -> Result<Wallet> {
        self.repo.unlock(passphrase)
    }

    /// Make `name` the active wallet, which must exist
    pub fn switch_wallet(&self, name: &str) -> Result<()> {
        self.repo.get_entity(name)?;
        self.repo.set_default(name)
    }

    /// All wallets, active one flagged
    pub fn list_wallets(&self) -> Result<Vec<WalletSummary>> {
        self.repo.get_all()
    }

    /// Delete `name`, clearing the active slot when it pointed there
    pub fn remove_wallet(&self, name: &str) -> Result<()> {
        self.repo.delete(name)?;
        if self.repo.get_active_wallet_name()?.as_deref() == Some(name) {
            self.repo.clear_default()?;
        }
        Ok(())
    }

    /// Persist the wallet's current indices
    pub fn persist(&self, wallet: &Wallet) -> Result<()> {
        self.repo.save(wallet)
    }

    /// Summary of `name` including its current receive address
    pub fn wallet_info(&self, name: &str, passphrase: &str) -> Result<WalletInfo> {
        let wallet = self.repo.unlock_wallet(name, passphrase)?;
        let is_default = self.repo.get_active_wallet_name()?.as_deref() == Some(name);

        Ok(WalletInfo {
            name: wallet.name().to_string(),
            is_default,
            receive_address: wallet.receive_address()?.address,
            next_receive_index: wallet.next_receive_index(),
            next_change_index: wallet.next_change_index(),
            created_at: wallet.created_at(),
        })
    }
}
