//! Wallet repository
//!
//! Wallets are stored one per namespace (`wallet_<name>`) as sealed
//! [`WalletEntity`] JSON. The active wallet name lives in the `wallets`
//! namespace. Every method runs in its own transaction.

use crate::database::{self, Database};
use crate::security::StoreKey;
use crate::{Error, Result, StorageConfig, WalletEntity, WalletSummary};
use parking_lot::Mutex;
use rusqlite::Connection;
use satellion_core::Wallet;

const WALLET_NAMESPACE_PREFIX: &str = "wallet_";
const WALLET_RECORD_KEY: &str = "wallet";
const META_NAMESPACE: &str = "wallets";
const ACTIVE_WALLET_KEY: &str = "active_wallet";

fn wallet_namespace(name: &str) -> String {
    format!("{}{}", WALLET_NAMESPACE_PREFIX, name)
}

/// Wallet records and the active-wallet pointer
pub struct WalletRepository {
    db: Mutex<Database>,
    key: StoreKey,
}

impl WalletRepository {
    /// Create repository
    pub fn new(db: Database, key: StoreKey) -> Self {
        Self {
            db: Mutex::new(db),
            key,
        }
    }

    /// Open the wallet database described by `config`
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let db = Database::open(config.wallet_db_path())?;
        Ok(Self::new(db, StoreKey::from_secret(&config.enclave_secret)))
    }

    /// Insert or replace the record for `wallet`
    pub fn save(&self, wallet: &Wallet) -> Result<()> {
        let sealed = self.seal_entity(&WalletEntity::from(wallet))?;

        let mut db = self.db.lock();
        let tx = db.transaction()?;
        database::put(&tx, &wallet_namespace(wallet.name()), WALLET_RECORD_KEY, &sealed)?;
        tx.commit()?;

        tracing::debug!("Saved wallet {}", wallet.name());
        Ok(())
    }

    /// Save `wallet`, making it active when no wallet is active yet.
    ///
    /// Both writes commit together. Returns whether the wallet became active.
    pub fn add(&self, wallet: &Wallet) -> Result<bool> {
        if wallet.name().trim().is_empty() {
            return Err(Error::Validation("wallet name is required".to_string()));
        }
        let sealed = self.seal_entity(&WalletEntity::from(wallet))?;

        let mut db = self.db.lock();
        let tx = db.transaction()?;
        database::put(&tx, &wallet_namespace(wallet.name()), WALLET_RECORD_KEY, &sealed)?;

        let activate = read_active_name(&tx)?.is_none();
        if activate {
            database::put(&tx, META_NAMESPACE, ACTIVE_WALLET_KEY, wallet.name().as_bytes())?;
        }
        tx.commit()?;

        tracing::info!("Added wallet {} (active: {})", wallet.name(), activate);
        Ok(activate)
    }

    /// Stored record for `name`
    pub fn get_entity(&self, name: &str) -> Result<WalletEntity> {
        let sealed = {
            let db = self.db.lock();
            database::get(db.conn(), &wallet_namespace(name), WALLET_RECORD_KEY)?
        };
        let sealed = sealed.ok_or_else(|| Error::NotFound(format!("wallet {}", name)))?;
        self.open_entity(&sealed)
    }

    /// Rebuild the wallet `name` with `passphrase`.
    ///
    /// The passphrase is not checked here; use [`WalletRepository::unlock_wallet`]
    /// to authenticate.
    pub fn get(&self, name: &str, passphrase: &str) -> Result<Wallet> {
        let entity = self.get_entity(name)?;
        Ok(entity.to_wallet(passphrase)?)
    }

    /// Every readable wallet, by name. Unreadable records are skipped.
    pub fn get_all(&self) -> Result<Vec<WalletSummary>> {
        let (records, active) = {
            let db = self.db.lock();
            let conn = db.conn();
            let namespaces = database::list_namespaces(conn, WALLET_NAMESPACE_PREFIX)?;
            let mut records = Vec::with_capacity(namespaces.len());
            for namespace in namespaces {
                let value = database::get(conn, &namespace, WALLET_RECORD_KEY)?;
                records.push((namespace, value));
            }
            (records, read_active_name(conn)?)
        };

        let mut summaries = Vec::with_capacity(records.len());
        for (namespace, value) in records {
            let entity = match value {
                Some(sealed) => self.open_entity(&sealed),
                None => Err(Error::NotFound(format!("record in {}", namespace))),
            };

            match entity {
                Ok(entity) => summaries.push(WalletSummary {
                    is_default: active.as_deref() == Some(entity.name.as_str()),
                    name: entity.name.clone(),
                    next_change_index: entity.next_change_index,
                    next_receive_index: entity.next_receive_index,
                    created_at: entity.created_at,
                }),
                Err(e) => {
                    tracing::warn!("Skipping unreadable wallet record in {}: {}", namespace, e);
                }
            }
        }
        Ok(summaries)
    }

    /// Remove the wallet's namespace
    pub fn delete(&self, name: &str) -> Result<()> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;
        let removed = database::drop_namespace(&tx, &wallet_namespace(name))?;
        tx.commit()?;

        if removed == 0 {
            return Err(Error::NotFound(format!("wallet {}", name)));
        }
        tracing::info!("Deleted wallet {}", name);
        Ok(())
    }

    /// Point the active slot at `name` without checking that it exists
    pub fn set_default(&self, name: &str) -> Result<()> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;
        database::put(&tx, META_NAMESPACE, ACTIVE_WALLET_KEY, name.as_bytes())?;
        tx.commit()?;

        tracing::info!("Active wallet set to {}", name);
        Ok(())
    }

    /// Empty the active slot
    pub fn clear_default(&self) -> Result<()> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;
        database::remove(&tx, META_NAMESPACE, ACTIVE_WALLET_KEY)?;
        tx.commit()?;
        Ok(())
    }

    /// Name in the active slot, if any
    pub fn get_active_wallet_name(&self) -> Result<Option<String>> {
        let db = self.db.lock();
        read_active_name(db.conn())
    }

    /// Rebuild the active wallet
    pub fn get_active_wallet(&self, passphrase: &str) -> Result<Wallet> {
        let name = self
            .get_active_wallet_name()?
            .ok_or_else(|| Error::NotFound("active wallet".to_string()))?;
        self.get(&name, passphrase)
    }

    /// Rebuild `name` and check `passphrase` against its lock
    pub fn unlock_wallet(&self, name: &str, passphrase: &str) -> Result<Wallet> {
        let wallet = self.get(name, passphrase)?;
        wallet.verify_passphrase(passphrase)?;
        Ok(wallet)
    }

    /// Authenticate `passphrase` against the active wallet
    pub fn unlock(&self, passphrase: &str) -> Result<Wallet> {
        let wallet = self.get_active_wallet(passphrase)?;
        wallet.verify_passphrase(passphrase)?;
        tracing::debug!("Unlocked wallet {}", wallet.name());
        Ok(wallet)
    }

    fn seal_entity(&self, entity: &WalletEntity) -> Result<Vec<u8>> {
        let json = zeroize::Zeroizing::new(serde_json::to_vec(entity)?);
        self.key.seal(&json)
    }

    fn open_entity(&self, sealed: &[u8]) -> Result<WalletEntity> {
        let json = zeroize::Zeroizing::new(self.key.open(sealed)?);
        Ok(serde_json::from_slice(&json)?)
    }
}

fn read_active_name(conn: &Connection) -> Result<Option<String>> {
    match database::get(conn, META_NAMESPACE, ACTIVE_WALLET_KEY)? {
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| Error::Validation(format!("active wallet name: {}", e))),
        None => Ok(None),
    }
}
