//! Chain readiness and scan tuning

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default minimum connected peers before the chain counts as synced
pub const DEFAULT_MIN_PEERS: u32 = 5;

/// Default maximum best-block age, in minutes, for the chain to count as current
pub const DEFAULT_SYNC_TIMEOUT_MINUTES: u64 = 30;

/// Default number of most recent blocks a scan may cover
pub const DEFAULT_MAX_SCAN_BLOCKS: u32 = 50_000;

/// Default number of blocks between progress updates
pub const DEFAULT_PROGRESS_INTERVAL: u32 = 1_000;

/// Default highest index scanned for a wallet that has never advanced
pub const DEFAULT_LOOKAHEAD: u32 = 20;

/// Chain readiness settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Initial peers (host:port) handed to the sync client
    pub peers: Vec<String>,
    /// Minimum connected peers; 0 means the default
    pub min_peers: u32,
    /// Maximum best-block age in minutes; 0 means the default
    pub sync_timeout_minutes: u64,
    /// Readiness poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl ChainConfig {
    /// Replace zero values with defaults
    pub fn normalized(mut self) -> Self {
        if self.min_peers == 0 {
            self.min_peers = DEFAULT_MIN_PEERS;
        }
        if self.sync_timeout_minutes == 0 {
            self.sync_timeout_minutes = DEFAULT_SYNC_TIMEOUT_MINUTES;
        }
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = 1_000;
        }
        self
    }

    /// Best-block age limit
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_minutes * 60)
    }

    /// Readiness poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            peers: Vec::new(),
            min_peers: DEFAULT_MIN_PEERS,
            sync_timeout_minutes: DEFAULT_SYNC_TIMEOUT_MINUTES,
            poll_interval_ms: 1_000,
        }
    }
}

/// Balance scan settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Scan at most this many of the most recent blocks
    pub max_scan_blocks: u32,
    /// Blocks between progress updates
    pub progress_interval: u32,
    /// Highest index scanned when both wallet indices are zero
    pub default_lookahead: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_scan_blocks: DEFAULT_MAX_SCAN_BLOCKS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            default_lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}
