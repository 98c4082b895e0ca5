//! Encrypted blob store
//!
//! Each logical key maps to one file named `hex(sha256(key)).enc` holding
//! `nonce || AES-256-GCM(data)`. File names cannot be reversed to keys, so the
//! enclave keeps its own encrypted index of logical keys for [`Enclave::list`].
//!
//! Writes to one key are not serialized here; callers must not save the same
//! key concurrently. Index updates are serialized, so concurrent saves of
//! different keys all show up in [`Enclave::list`]. An index that can no longer
//! be opened is rebuilt on the next save or delete rather than failing it.

use crate::security::{hash_sha256, StoreKey};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

const BLOB_EXTENSION: &str = "enc";
const INDEX_KEY: &str = "__enclave_index__";

/// Encrypted key-value blob store rooted at one directory
#[derive(Debug)]
pub struct Enclave {
    root: PathBuf,
    key: StoreKey,
    index_lock: Mutex<()>,
}

impl Enclave {
    /// Open the store, creating `root` owner-only if missing
    pub fn open(root: impl Into<PathBuf>, secret: &str) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        restrict_permissions(&root)?;

        tracing::debug!("Enclave opened at {}", root.display());
        Ok(Self {
            root,
            key: StoreKey::from_secret(secret),
            index_lock: Mutex::new(()),
        })
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Seal `data` under `key`, replacing any previous value
    pub fn save(&self, key: &str, data: &[u8]) -> Result<()> {
        ensure_not_reserved(key)?;
        self.write_blob(key, data)?;

        let _guard = self.index_lock.lock();
        let (mut index, rebuilt) = self.read_index_for_update()?;
        if index.insert(key.to_string()) || rebuilt {
            self.write_index(&index)?;
        }

        tracing::debug!("Enclave saved {} bytes", data.len());
        Ok(())
    }

    /// Open the value stored under `key`
    pub fn load(&self, key: &str) -> Result<Vec<u8>> {
        ensure_not_reserved(key)?;
        self.read_blob(key)?
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Remove `key`
    pub fn delete(&self, key: &str) -> Result<()> {
        ensure_not_reserved(key)?;
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(Error::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let _guard = self.index_lock.lock();
        let (mut index, rebuilt) = self.read_index_for_update()?;
        if index.remove(key) || rebuilt {
            self.write_index(&index)?;
        }
        Ok(())
    }

    /// True when a blob exists for `key`
    pub fn exists(&self, key: &str) -> bool {
        key != INDEX_KEY && self.blob_path(key).is_file()
    }

    /// Logical keys, sorted. Fails with the index's own error if it cannot be
    /// opened; the next save or delete rebuilds it.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.read_index()?.into_iter().collect())
    }

    /// Blob file names present in the root, sorted
    pub fn list_files(&self) -> Result<Vec<String>> {
        let index_file = blob_file_name(INDEX_KEY);
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name != index_file {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Path of the blob for `key`
    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(blob_file_name(key))
    }

    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.blob_path(key)) {
            Ok(sealed) => self.key.open(&sealed).map(Some),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_blob(&self, key: &str, data: &[u8]) -> Result<()> {
        let sealed = self.key.seal(data)?;

        // Rename over the target so readers never see a partial blob
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&sealed)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.blob_path(key)).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn read_index(&self) -> Result<BTreeSet<String>> {
        match self.read_blob(INDEX_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(BTreeSet::new()),
        }
    }

    // Keys recorded in an unreadable index are lost; the index restarts from
    // the entries written after it.
    fn read_index_for_update(&self) -> Result<(BTreeSet<String>, bool)> {
        match self.read_index() {
            Ok(index) => Ok((index, false)),
            Err(e @ (Error::Encryption(_) | Error::Serialization(_))) => {
                tracing::warn!("Enclave index unreadable, rebuilding: {}", e);
                Ok((BTreeSet::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_index(&self, index: &BTreeSet<String>) -> Result<()> {
        self.write_blob(INDEX_KEY, &serde_json::to_vec(index)?)
    }
}

/// `hex(sha256(key)).enc`
pub fn blob_file_name(key: &str) -> String {
    format!("{}.{}", hash_sha256(key.as_bytes()), BLOB_EXTENSION)
}

fn ensure_not_reserved(key: &str) -> Result<()> {
    if key == INDEX_KEY {
        return Err(Error::Validation(format!("{} is reserved", INDEX_KEY)));
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
