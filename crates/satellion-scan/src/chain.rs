//! Chain collaborator consumed by the scanner
//!
//! The light client that syncs headers and compact filters lives outside this
//! crate. It is reached through [`Chain`], which exposes only what balance
//! scanning and the readiness gate need.

use crate::filter::CompactFilter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub use bitcoin::BlockHash;

/// Chain tip as seen by the sync client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestBlock {
    /// Tip height
    pub height: u32,
    /// Tip hash
    pub hash: BlockHash,
    /// Tip header timestamp
    pub timestamp: DateTime<Utc>,
    /// Peers currently connected
    pub connected_peers: u32,
}

/// Block header fields the scanner reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block hash
    pub hash: BlockHash,
    /// Header timestamp
    pub timestamp: DateTime<Utc>,
}

/// Header and compact filter source
#[async_trait]
pub trait Chain: Send + Sync {
    /// Current tip. Fails if the client is not started or unreachable.
    async fn best_block(&self) -> anyhow::Result<BestBlock>;

    /// Hash of the block at `height`
    async fn get_block_hash(&self, height: u32) -> anyhow::Result<BlockHash>;

    /// Header of the block with `hash`
    async fn get_block_header(&self, hash: &BlockHash) -> anyhow::Result<BlockHeader>;

    /// BIP158 basic filter of the block with `hash`
    async fn get_cfilter(&self, hash: &BlockHash) -> anyhow::Result<CompactFilter>;

    /// Whether the client considers itself caught up with the network
    async fn is_synced(&self) -> bool;
}

#[async_trait]
impl<T: Chain + ?Sized> Chain for Arc<T> {
    async fn best_block(&self) -> anyhow::Result<BestBlock> {
        (**self).best_block().await
    }

    async fn get_block_hash(&self, height: u32) -> anyhow::Result<BlockHash> {
        (**self).get_block_hash(height).await
    }

    async fn get_block_header(&self, hash: &BlockHash) -> anyhow::Result<BlockHeader> {
        (**self).get_block_header(hash).await
    }

    async fn get_cfilter(&self, hash: &BlockHash) -> anyhow::Result<CompactFilter> {
        (**self).get_cfilter(hash).await
    }

    async fn is_synced(&self) -> bool {
        (**self).is_synced().await
    }
}
