//! Satellion balance scanning
//!
//! Compact filter (BIP158) balance scans over an external [`Chain`], gated on
//! the chain reporting itself current and runnable as a cancellable
//! background task.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod background;
pub mod balance;
pub mod cancel;
pub mod chain;
pub mod config;
pub mod error;
pub mod filter;
pub mod progress;
pub mod sync_gate;

#[cfg(feature = "test-helpers")]
pub mod testing;

pub use background::{spawn_balance_scan, BackgroundScanConfig, ScanHandle};
pub use balance::{BalanceInfo, BalanceScanner, ScanWindow, PLACEHOLDER_SATS_PER_MATCH};
pub use cancel::CancelToken;
pub use chain::{BestBlock, BlockHash, BlockHeader, Chain};
pub use config::{ChainConfig, ScanConfig};
pub use error::{Error, Result};
pub use filter::{CompactFilter, FilterKey};
pub use progress::{ScanProgress, ScanStage, ScanUpdate};
pub use sync_gate::SyncGate;
