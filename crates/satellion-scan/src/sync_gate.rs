//! Readiness gate between chain sync and balance scanning

use crate::cancel::CancelToken;
use crate::chain::{BestBlock, Chain};
use crate::config::ChainConfig;
use crate::{Error, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};

/// Decides when the chain is current enough to scan
#[derive(Debug, Clone)]
pub struct SyncGate {
    config: ChainConfig,
}

impl SyncGate {
    /// Gate with `config`, zero values replaced by defaults
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    /// Effective configuration
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Whether `best` together with the client's own sync flag counts as current.
    ///
    /// Requires at least `min_peers` connected peers, the client reporting
    /// itself synced, and a tip younger than `sync_timeout`. A client that
    /// says it is behind is never current, however recent its tip.
    pub fn is_current(&self, best: &BestBlock, client_synced: bool) -> bool {
        if best.connected_peers < self.config.min_peers || !client_synced {
            return false;
        }
        let age = Utc::now()
            .signed_duration_since(best.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO);
        age < self.config.sync_timeout()
    }

    /// Single readiness check
    pub async fn check(&self, chain: &dyn Chain) -> Result<Option<BestBlock>> {
        let best = chain
            .best_block()
            .await
            .map_err(|e| Error::chain("best block unavailable", e))?;
        let synced = chain.is_synced().await;
        if self.is_current(&best, synced) {
            Ok(Some(best))
        } else {
            Ok(None)
        }
    }

    /// Poll until the chain is current, returning the tip that satisfied the gate.
    ///
    /// Errors from the chain while polling are treated as "not yet ready".
    /// Returns [`Error::Cancelled`] once `cancel` fires.
    pub async fn wait_until_synced(&self, chain: &dyn Chain, cancel: &CancelToken) -> Result<BestBlock> {
        let poll = self.config.poll_interval();
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match self.check(chain).await {
                Ok(Some(best)) => {
                    info!(
                        "Chain current at height {} with {} peers",
                        best.height, best.connected_peers
                    );
                    return Ok(best);
                }
                Ok(None) => {}
                Err(e) => debug!("Waiting for chain: {}", e),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::BlockHash;

    fn tip(peers: u32, age_minutes: i64) -> BestBlock {
        BestBlock {
            height: 100,
            hash: BlockHash::all_zeros(),
            timestamp: Utc::now() - chrono::Duration::minutes(age_minutes),
            connected_peers: peers,
        }
    }

    #[test]
    fn test_requires_min_peers() {
        let gate = SyncGate::default();
        assert!(!gate.is_current(&tip(4, 0), true));
        assert!(gate.is_current(&tip(5, 0), true));
    }

    #[test]
    fn test_fresh_tip_without_client_flag_is_not_current() {
        let gate = SyncGate::default();
        assert!(!gate.is_current(&tip(8, 0), false));
    }

    #[test]
    fn test_stale_tip_is_not_current() {
        let gate = SyncGate::default();
        assert!(!gate.is_current(&tip(8, 45), true));
        assert!(gate.is_current(&tip(8, 29), true));
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let gate = SyncGate::default();
        assert!(gate.is_current(&tip(5, -10), true));
    }

    #[test]
    fn test_zero_config_normalizes() {
        let gate = SyncGate::new(ChainConfig {
            min_peers: 0,
            sync_timeout_minutes: 0,
            ..ChainConfig::default()
        });
        assert_eq!(gate.config().min_peers, 5);
        assert_eq!(gate.config().sync_timeout_minutes, 30);
    }
}
