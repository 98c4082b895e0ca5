//! Background balance scan
//!
//! Runs the readiness gate and then the scan in a tokio task. Progress is
//! published on a `watch` channel so a caller can render it without blocking.

use crate::balance::{BalanceInfo, BalanceScanner};
use crate::cancel::CancelToken;
use crate::chain::Chain;
use crate::config::{ChainConfig, ScanConfig};
use crate::progress::{ScanStage, ScanUpdate};
use crate::sync_gate::SyncGate;
use crate::{Error, Result};
use satellion_core::Wallet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Background scan configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundScanConfig {
    /// Readiness gate settings
    pub chain: ChainConfig,
    /// Scan settings
    pub scan: ScanConfig,
}

/// Handle to a running background scan
pub struct ScanHandle {
    updates: watch::Receiver<ScanUpdate>,
    cancel: CancelToken,
    task: JoinHandle<Result<BalanceInfo>>,
}

impl ScanHandle {
    /// Receiver of progress updates
    pub fn updates(&self) -> watch::Receiver<ScanUpdate> {
        self.updates.clone()
    }

    /// Most recent update
    pub fn latest(&self) -> ScanUpdate {
        self.updates.borrow().clone()
    }

    /// Request cancellation; [`ScanHandle::join`] then returns [`Error::Cancelled`]
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the task has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the scan result
    pub async fn join(self) -> Result<BalanceInfo> {
        self.task
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }
}

/// Start a gated balance scan for `wallet` on the current tokio runtime
pub fn spawn_balance_scan(
    chain: Arc<dyn Chain>,
    wallet: Wallet,
    config: BackgroundScanConfig,
    cancel: CancelToken,
) -> ScanHandle {
    let (tx, rx) = watch::channel(ScanUpdate::stage(ScanStage::WaitingForSync));
    let task_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        let result = run_scan(chain, &wallet, config, task_cancel, &tx).await;
        match &result {
            Ok(info) => info!(
                "Background scan of {} complete: balance {} across {} outputs",
                wallet.name(),
                info.balance,
                info.utxo_count
            ),
            Err(Error::Cancelled) => info!("Background scan of {} cancelled", wallet.name()),
            Err(e) => error!("Background scan of {} failed: {}", wallet.name(), e),
        }
        result
    });

    ScanHandle {
        updates: rx,
        cancel,
        task,
    }
}

async fn run_scan(
    chain: Arc<dyn Chain>,
    wallet: &Wallet,
    config: BackgroundScanConfig,
    cancel: CancelToken,
    tx: &watch::Sender<ScanUpdate>,
) -> Result<BalanceInfo> {
    let gate = SyncGate::new(config.chain);
    gate.wait_until_synced(chain.as_ref(), &cancel).await?;

    tx.send_replace(ScanUpdate::stage(ScanStage::Locating));
    let scanner = BalanceScanner::new(chain, config.scan).with_cancel(cancel);
    let info = scanner
        .scan_with_progress(wallet, |update| {
            tx.send_replace(update.clone());
        })
        .await?;

    tx.send_replace(scanner.progress().snapshot());
    Ok(info)
}
