//! Balance scanning over BIP158 compact filters
//!
//! A scan locates the wallet's birth height by binary searching header
//! timestamps, derives the wallet's receive and change scripts, and tests
//! every block filter from there to the tip.
//!
//! The resulting balance is a placeholder: each filter match counts as one
//! output worth [`PLACEHOLDER_SATS_PER_MATCH`]. Matched blocks are not
//! downloaded, so output values and spends are not accounted for, and filter
//! false positives inflate the count.

use crate::cancel::CancelToken;
use crate::chain::{BestBlock, Chain};
use crate::config::ScanConfig;
use crate::filter::FilterKey;
use crate::progress::{ScanProgress, ScanStage, ScanUpdate};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use satellion_core::Wallet;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Value credited per filter match
pub const PLACEHOLDER_SATS_PER_MATCH: u64 = 1_000;

/// Aggregate result of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BalanceInfo {
    /// Balance in satoshis (see [`PLACEHOLDER_SATS_PER_MATCH`])
    pub balance: u64,
    /// Matched outputs
    pub utxo_count: u64,
}

impl BalanceInfo {
    /// Balance for `matches` filter hits
    pub fn from_matches(matches: u64) -> Self {
        Self {
            balance: matches.saturating_mul(PLACEHOLDER_SATS_PER_MATCH),
            utxo_count: matches,
        }
    }
}

/// Block range covered by one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    /// First height scanned
    pub start_height: u32,
    /// Last height scanned (the tip)
    pub best_height: u32,
}

impl ScanWindow {
    /// Window from `start_height` to `best_height`, keeping at most `max_blocks`
    /// of the most recent heights. Zero means no cap.
    pub fn capped(start_height: u32, best_height: u32, max_blocks: u32) -> Self {
        let start_height = start_height.min(best_height);
        let count = best_height - start_height + 1;
        let start_height = if max_blocks > 0 && count > max_blocks {
            best_height - max_blocks + 1
        } else {
            start_height
        };
        Self {
            start_height,
            best_height,
        }
    }

    /// Number of blocks in the window, never zero
    pub fn block_count(&self) -> u32 {
        self.best_height - self.start_height + 1
    }
}

/// Compact filter balance scanner
pub struct BalanceScanner {
    chain: Arc<dyn Chain>,
    config: ScanConfig,
    cancel: CancelToken,
    progress: ScanProgress,
}

impl BalanceScanner {
    /// Scanner over `chain`
    pub fn new(chain: Arc<dyn Chain>, config: ScanConfig) -> Self {
        Self {
            chain,
            config,
            cancel: CancelToken::new(),
            progress: ScanProgress::new(),
        }
    }

    /// Use a caller-owned cancellation token
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Cancellation token checked before every block
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Shared progress handle
    pub fn progress(&self) -> ScanProgress {
        self.progress.clone()
    }

    /// Scan without progress reporting
    pub async fn scan(&self, wallet: &Wallet) -> Result<BalanceInfo> {
        self.scan_with_progress(wallet, |_| {}).await
    }

    /// Scan `wallet`, calling `on_progress` every `progress_interval` blocks
    /// and once the last block is processed.
    ///
    /// A block whose hash or filter cannot be fetched, or whose filter cannot
    /// be decoded, is logged and skipped. Skipped blocks count towards
    /// progress but contribute no matches.
    pub async fn scan_with_progress<F>(&self, wallet: &Wallet, mut on_progress: F) -> Result<BalanceInfo>
    where
        F: FnMut(&ScanUpdate) + Send,
    {
        let created_at = wallet.created_at().ok_or_else(|| {
            Error::InvalidState(format!("wallet {} has no creation time", wallet.name()))
        })?;

        let best = self.best_block().await?;

        self.progress.set_stage(ScanStage::Locating);
        let birth_height = self.find_start_height(created_at, best.height).await?;
        let window = ScanWindow::capped(birth_height, best.height, self.config.max_scan_blocks);
        if window.start_height != birth_height {
            debug!(
                "Capped scan start from {} to {} ({} block limit)",
                birth_height, window.start_height, self.config.max_scan_blocks
            );
        }

        let scripts = self.address_scripts(wallet)?;
        info!(
            "Scanning {} blocks {}..={} for wallet {} ({} scripts)",
            window.block_count(),
            window.start_height,
            window.best_height,
            wallet.name(),
            scripts.len()
        );

        self.progress.start(window.start_height, window.best_height);
        let interval = self.config.progress_interval.max(1);
        let total = window.block_count();

        for height in window.start_height..=window.best_height {
            if self.cancel.is_cancelled() {
                info!("Balance scan cancelled at height {}", height);
                return Err(Error::Cancelled);
            }

            match self.block_matches(height, &scripts).await {
                Ok(matches) => {
                    if matches > 0 {
                        debug!("Block {} matched {} scripts", height, matches);
                    }
                    self.progress.record_block(matches);
                }
                Err(e) => {
                    warn!("Skipping block {}: {}", height, e);
                    self.progress.record_skip();
                }
            }

            let processed = self.progress.processed();
            if processed % interval == 0 || processed == total {
                on_progress(&self.progress.snapshot());
            }
        }

        self.progress.set_stage(ScanStage::Complete);
        let info = BalanceInfo::from_matches(self.progress.matches());
        info!("Balance scan finished: {}", self.progress.summary());
        Ok(info)
    }

    /// Smallest height whose header timestamp is at or after `created_at`,
    /// stepped back by one unless already at genesis. Result lies in
    /// `[0, best_height]`.
    pub async fn find_start_height(&self, created_at: DateTime<Utc>, best_height: u32) -> Result<u32> {
        let mut low = 0u32;
        let mut high = best_height;

        while low < high {
            let mid = low + (high - low) / 2;
            let hash = self
                .chain
                .get_block_hash(mid)
                .await
                .map_err(|e| Error::chain("block hash lookup failed", e))?;
            let header = self
                .chain
                .get_block_header(&hash)
                .await
                .map_err(|e| Error::chain("block header lookup failed", e))?;

            if header.timestamp < created_at {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        let start = low.saturating_sub(1);
        debug!("Wallet birth at {} resolves to start height {}", created_at, start);
        Ok(start)
    }

    /// Receive and change scripts for the indices the wallet has used.
    /// A wallet that never advanced either index gets the default lookahead.
    pub fn address_scripts(&self, wallet: &Wallet) -> Result<Vec<Vec<u8>>> {
        let max_index = wallet.next_receive_index().max(wallet.next_change_index());
        let max_index = if max_index == 0 {
            self.config.default_lookahead
        } else {
            max_index
        };
        Ok(wallet.scripts(max_index)?)
    }

    async fn best_block(&self) -> Result<BestBlock> {
        self.chain
            .best_block()
            .await
            .map_err(|e| Error::chain("best block unavailable", e))
    }

    async fn block_matches(&self, height: u32, scripts: &[Vec<u8>]) -> Result<u64> {
        let hash = self
            .chain
            .get_block_hash(height)
            .await
            .map_err(|e| Error::chain("block hash lookup failed", e))?;
        let filter = self
            .chain
            .get_cfilter(&hash)
            .await
            .map_err(|e| Error::chain("filter fetch failed", e))?;
        filter.count_matches(&FilterKey::from_block_hash(&hash), scripts)
    }
}
