//! In-memory chain for tests
//!
//! Blocks carry real BIP158 filters built under their own block hash, so
//! scans against a [`MemoryChain`] exercise the same matching path as a
//! live client.

use crate::chain::{BestBlock, BlockHash, BlockHeader, Chain};
use crate::filter::{CompactFilter, FilterKey};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use bitcoin::hashes::{sha256d, Hash};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct MemoryBlock {
    hash: BlockHash,
    timestamp: DateTime<Utc>,
    filter: CompactFilter,
}

#[derive(Debug, Default)]
struct ChainState {
    blocks: Vec<MemoryBlock>,
    connected_peers: u32,
    synced: bool,
    offline: bool,
    broken_filters: HashSet<u32>,
}

/// Chain held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryChain {
    state: RwLock<ChainState>,
    header_fetches: AtomicUsize,
}

impl MemoryChain {
    /// Empty chain with no peers
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` blocks with empty filters, the first at `genesis_time` and
    /// each later one `spacing` after the previous
    pub fn with_blocks(
        count: u32,
        genesis_time: DateTime<Utc>,
        spacing: chrono::Duration,
    ) -> anyhow::Result<Self> {
        let chain = Self::new();
        let mut timestamp = genesis_time;
        for _ in 0..count {
            chain.push_block(timestamp, &[])?;
            timestamp += spacing;
        }
        Ok(chain)
    }

    /// Append a block whose filter contains `scripts`
    pub fn push_block(&self, timestamp: DateTime<Utc>, scripts: &[Vec<u8>]) -> anyhow::Result<BlockHash> {
        let mut state = self.state.write();
        let height = state.blocks.len() as u32;
        let hash = block_hash_at(height);
        let filter = build_filter(&hash, scripts)?;
        state.blocks.push(MemoryBlock {
            hash,
            timestamp,
            filter,
        });
        Ok(hash)
    }

    /// Replace the filter of the block at `height` with one containing `scripts`
    pub fn set_block_scripts(&self, height: u32, scripts: &[Vec<u8>]) -> anyhow::Result<()> {
        let mut state = self.state.write();
        let block = state
            .blocks
            .get_mut(height as usize)
            .ok_or_else(|| anyhow!("no block at height {}", height))?;
        block.filter = build_filter(&block.hash, scripts)?;
        Ok(())
    }

    /// Make filter fetches for `height` fail
    pub fn break_filter(&self, height: u32) {
        self.state.write().broken_filters.insert(height);
    }

    /// Set the connected peer count
    pub fn set_connected_peers(&self, peers: u32) {
        self.state.write().connected_peers = peers;
    }

    /// Set the client's own sync flag
    pub fn set_synced(&self, synced: bool) {
        self.state.write().synced = synced;
    }

    /// Make every call fail as if the client were stopped
    pub fn set_offline(&self, offline: bool) {
        self.state.write().offline = offline;
    }

    /// Tip height, if any block exists
    pub fn height(&self) -> Option<u32> {
        self.state.read().blocks.len().checked_sub(1).map(|h| h as u32)
    }

    /// Timestamp of the block at `height`
    pub fn timestamp(&self, height: u32) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .blocks
            .get(height as usize)
            .map(|b| b.timestamp)
    }

    /// Header lookups served so far
    pub fn header_fetches(&self) -> usize {
        self.header_fetches.load(Ordering::Relaxed)
    }

    fn ensure_online(state: &ChainState) -> anyhow::Result<()> {
        if state.offline {
            bail!("chain service not started");
        }
        Ok(())
    }
}

#[async_trait]
impl Chain for MemoryChain {
    async fn best_block(&self) -> anyhow::Result<BestBlock> {
        let state = self.state.read();
        Self::ensure_online(&state)?;
        let tip = state.blocks.last().ok_or_else(|| anyhow!("no blocks"))?;
        Ok(BestBlock {
            height: (state.blocks.len() - 1) as u32,
            hash: tip.hash,
            timestamp: tip.timestamp,
            connected_peers: state.connected_peers,
        })
    }

    async fn get_block_hash(&self, height: u32) -> anyhow::Result<BlockHash> {
        let state = self.state.read();
        Self::ensure_online(&state)?;
        state
            .blocks
            .get(height as usize)
            .map(|b| b.hash)
            .ok_or_else(|| anyhow!("no block at height {}", height))
    }

    async fn get_block_header(&self, hash: &BlockHash) -> anyhow::Result<BlockHeader> {
        self.header_fetches.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read();
        Self::ensure_online(&state)?;
        state
            .blocks
            .iter()
            .find(|b| &b.hash == hash)
            .map(|b| BlockHeader {
                hash: b.hash,
                timestamp: b.timestamp,
            })
            .ok_or_else(|| anyhow!("unknown block {}", hash))
    }

    async fn get_cfilter(&self, hash: &BlockHash) -> anyhow::Result<CompactFilter> {
        let state = self.state.read();
        Self::ensure_online(&state)?;
        let height = state
            .blocks
            .iter()
            .position(|b| &b.hash == hash)
            .ok_or_else(|| anyhow!("unknown block {}", hash))?;
        if state.broken_filters.contains(&(height as u32)) {
            bail!("filter for block {} unavailable", hash);
        }
        Ok(state.blocks[height].filter.clone())
    }

    async fn is_synced(&self) -> bool {
        self.state.read().synced
    }
}

fn block_hash_at(height: u32) -> BlockHash {
    BlockHash::from_raw_hash(sha256d::Hash::hash(&height.to_le_bytes()))
}

fn build_filter(hash: &BlockHash, scripts: &[Vec<u8>]) -> anyhow::Result<CompactFilter> {
    let key = FilterKey::from_block_hash(hash);
    Ok(CompactFilter::build(&key, scripts.iter().map(|s| s.as_slice()))?)
}
