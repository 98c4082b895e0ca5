//! BIP158 basic filter matching
//!
//! Filters are Golomb-coded sets keyed with SipHash. The key is the first 16
//! bytes of the block hash in internal byte order, split into two
//! little-endian `u64` halves.

use crate::chain::BlockHash;
use crate::{Error, Result};
use bitcoin::bip158::{GcsFilterReader, GcsFilterWriter};
use bitcoin::hashes::Hash;
use satellion_params::{FILTER_M, FILTER_P};
use std::fmt;

/// SipHash key for one block's filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterKey {
    k0: u64,
    k1: u64,
}

impl FilterKey {
    /// Derive the match key from a block hash
    pub fn from_block_hash(hash: &BlockHash) -> Self {
        let bytes = hash.to_byte_array();
        let mut k0 = [0u8; 8];
        let mut k1 = [0u8; 8];
        k0.copy_from_slice(&bytes[0..8]);
        k1.copy_from_slice(&bytes[8..16]);
        Self {
            k0: u64::from_le_bytes(k0),
            k1: u64::from_le_bytes(k1),
        }
    }

    fn reader(&self) -> GcsFilterReader {
        GcsFilterReader::new(self.k0, self.k1, FILTER_M, FILTER_P)
    }
}

/// Serialized basic filter: varint element count followed by the coded set
#[derive(Clone, PartialEq, Eq)]
pub struct CompactFilter {
    content: Vec<u8>,
}

impl CompactFilter {
    /// Wrap serialized filter bytes
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Encode a filter over `elements` under `key`
    pub fn build<'a, I>(key: &FilterKey, elements: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut content = Vec::new();
        {
            let mut writer = GcsFilterWriter::new(&mut content, key.k0, key.k1, FILTER_M, FILTER_P);
            for element in elements {
                writer.add_element(element);
            }
            writer
                .finish()
                .map_err(|e| Error::Filter(format!("encode failed: {}", e)))?;
        }
        Ok(Self { content })
    }

    /// Serialized bytes
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Probabilistic membership test for one script
    pub fn matches(&self, key: &FilterKey, script: &[u8]) -> Result<bool> {
        key.reader()
            .match_any(&mut self.content.as_slice(), std::iter::once(script))
            .map_err(|e| Error::Filter(e.to_string()))
    }

    /// Number of `scripts` the filter matches
    pub fn count_matches(&self, key: &FilterKey, scripts: &[Vec<u8>]) -> Result<u64> {
        let reader = key.reader();
        let mut matches = 0;
        for script in scripts {
            let hit = reader
                .match_any(&mut self.content.as_slice(), std::iter::once(script.as_slice()))
                .map_err(|e| Error::Filter(e.to_string()))?;
            if hit {
                matches += 1;
            }
        }
        Ok(matches)
    }
}

impl fmt::Debug for CompactFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompactFilter")
            .field("len", &self.content.len())
            .finish()
    }
}
