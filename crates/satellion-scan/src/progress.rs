//! Scan progress tracking

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Scan stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    /// Waiting for the chain to report it is current
    WaitingForSync,
    /// Binary searching for the wallet's birth height
    Locating,
    /// Matching compact filters
    Scanning,
    /// Finished
    Complete,
}

impl ScanStage {
    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::WaitingForSync => "Waiting for Sync",
            Self::Locating => "Locating Start Height",
            Self::Scanning => "Scanning Filters",
            Self::Complete => "Complete",
        }
    }
}

/// Point-in-time view of a scan, as delivered to progress callbacks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanUpdate {
    /// Stage at the time of the update
    pub stage: ScanStage,
    /// Blocks processed, skipped ones included
    pub processed: u32,
    /// Blocks in the scan window
    pub total: u32,
    /// `processed / total * 100`
    pub percent: f64,
}

impl ScanUpdate {
    /// Update for a stage with no block counts yet
    pub fn stage(stage: ScanStage) -> Self {
        Self {
            stage,
            processed: 0,
            total: 0,
            percent: 0.0,
        }
    }
}

/// Shared scan progress
#[derive(Debug, Clone)]
pub struct ScanProgress {
    inner: Arc<RwLock<ProgressInner>>,
}

#[derive(Debug, Clone)]
struct ProgressInner {
    stage: ScanStage,
    start_height: u32,
    best_height: u32,
    processed: u32,
    total: u32,
    matches: u64,
    skipped: u32,
    start_time: Option<Instant>,
}

impl ScanProgress {
    /// Create new progress tracker
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ProgressInner {
                stage: ScanStage::WaitingForSync,
                start_height: 0,
                best_height: 0,
                processed: 0,
                total: 0,
                matches: 0,
                skipped: 0,
                start_time: None,
            })),
        }
    }

    /// Begin a scan window and reset counters
    pub fn start(&self, start_height: u32, best_height: u32) {
        let mut inner = self.inner.write();
        inner.stage = ScanStage::Scanning;
        inner.start_height = start_height;
        inner.best_height = best_height;
        inner.total = best_height.saturating_sub(start_height) + 1;
        inner.processed = 0;
        inner.matches = 0;
        inner.skipped = 0;
        inner.start_time = Some(Instant::now());
    }

    /// Set stage
    pub fn set_stage(&self, stage: ScanStage) {
        self.inner.write().stage = stage;
    }

    /// Count a block whose filter was matched
    pub fn record_block(&self, matches: u64) {
        let mut inner = self.inner.write();
        inner.processed += 1;
        inner.matches += matches;
    }

    /// Count a block that could not be fetched or matched
    pub fn record_skip(&self) {
        let mut inner = self.inner.write();
        inner.processed += 1;
        inner.skipped += 1;
    }

    /// Get current stage
    pub fn stage(&self) -> ScanStage {
        self.inner.read().stage
    }

    /// Blocks processed so far
    pub fn processed(&self) -> u32 {
        self.inner.read().processed
    }

    /// Blocks in the window
    pub fn total(&self) -> u32 {
        self.inner.read().total
    }

    /// Script matches so far
    pub fn matches(&self) -> u64 {
        self.inner.read().matches
    }

    /// Blocks skipped after a fetch or match failure
    pub fn skipped(&self) -> u32 {
        self.inner.read().skipped
    }

    /// First height of the window
    pub fn start_height(&self) -> u32 {
        self.inner.read().start_height
    }

    /// Get progress percentage
    pub fn percentage(&self) -> f64 {
        let inner = self.inner.read();
        percent(inner.processed, inner.total)
    }

    /// Snapshot for callbacks and watchers
    pub fn snapshot(&self) -> ScanUpdate {
        let inner = self.inner.read();
        ScanUpdate {
            stage: inner.stage,
            processed: inner.processed,
            total: inner.total,
            percent: percent(inner.processed, inner.total),
        }
    }

    /// One-line status for logs
    pub fn summary(&self) -> String {
        let inner = self.inner.read();
        let elapsed = inner
            .start_time
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);
        format!(
            "{}: {}/{} blocks ({:.1}%), heights {}..={}, {} matches, {} skipped, {}s",
            inner.stage.name(),
            inner.processed,
            inner.total,
            percent(inner.processed, inner.total),
            inner.start_height,
            inner.best_height,
            inner.matches,
            inner.skipped,
            elapsed
        )
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(processed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    processed as f64 / total as f64 * 100.0
}
