//! Balance scans against an in-memory chain

use chrono::{DateTime, Duration, TimeZone, Utc};
use satellion_core::{AddressKind, ErrorKind, Mnemonic, Wallet};
use satellion_scan::testing::MemoryChain;
use satellion_scan::{BalanceInfo, BalanceScanner, CancelToken, Error, ScanConfig, ScanStage};
use std::sync::{Arc, Mutex};

const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const BLOCKS: u32 = 100;

fn genesis() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn block_time(height: u32) -> DateTime<Utc> {
    genesis() + Duration::minutes(10 * height as i64)
}

fn chain() -> Arc<MemoryChain> {
    Arc::new(MemoryChain::with_blocks(BLOCKS, genesis(), Duration::minutes(10)).unwrap())
}

fn wallet_born_at(created_at: DateTime<Utc>) -> Wallet {
    Wallet::new(Mnemonic::parse(ABANDON).unwrap(), "", "scan", 0, 0, None)
        .unwrap()
        .with_created_at(created_at)
}

fn script(wallet: &Wallet, kind: AddressKind, index: u32) -> Vec<u8> {
    wallet.address(kind, index).unwrap().script_pubkey()
}

#[tokio::test]
async fn test_start_height_steps_back_from_first_block_after_birth() {
    let chain = chain();
    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());

    for height in [0u32, 1, 2, 40, 63, 98, 99] {
        let start = scanner
            .find_start_height(block_time(height), BLOCKS - 1)
            .await
            .unwrap();
        assert_eq!(start, height.saturating_sub(1), "birth at block {}", height);
    }

    // Between blocks 40 and 41
    let start = scanner
        .find_start_height(block_time(40) + Duration::seconds(1), BLOCKS - 1)
        .await
        .unwrap();
    assert_eq!(start, 40);
}

#[tokio::test]
async fn test_start_height_is_clamped() {
    let chain = chain();
    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());

    let before_genesis = scanner
        .find_start_height(genesis() - Duration::days(1), BLOCKS - 1)
        .await
        .unwrap();
    assert_eq!(before_genesis, 0);

    let after_tip = scanner
        .find_start_height(block_time(BLOCKS + 10), BLOCKS - 1)
        .await
        .unwrap();
    assert!(after_tip <= BLOCKS - 1);
}

#[tokio::test]
async fn test_start_height_uses_logarithmic_lookups() {
    let chain = chain();
    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());
    scanner
        .find_start_height(block_time(37), BLOCKS - 1)
        .await
        .unwrap();
    assert!(chain.header_fetches() <= 8, "{} lookups", chain.header_fetches());
}

#[tokio::test]
async fn test_scan_without_matches_is_zero() {
    let chain = chain();
    let wallet = wallet_born_at(block_time(40));
    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());

    let info = scanner.scan(&wallet).await.unwrap();
    assert_eq!(info, BalanceInfo { balance: 0, utxo_count: 0 });

    let progress = scanner.progress();
    assert_eq!(progress.stage(), ScanStage::Complete);
    assert_eq!(progress.start_height(), 39);
    assert_eq!(progress.processed(), 61);
}

#[tokio::test]
async fn test_scan_counts_matches_after_birth() {
    let chain = chain();
    let wallet = wallet_born_at(block_time(40));
    let receive = script(&wallet, AddressKind::Receive, 0);
    let change = script(&wallet, AddressKind::Change, 3);

    chain.set_block_scripts(10, &[receive.clone()]).unwrap();
    chain.set_block_scripts(50, &[receive.clone()]).unwrap();
    chain
        .set_block_scripts(60, &[receive.clone(), change, vec![0x00, 0x14, 0xaa]])
        .unwrap();

    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());
    let info = scanner.scan(&wallet).await.unwrap();

    assert_eq!(info.utxo_count, 3);
    assert_eq!(info.balance, 3 * satellion_scan::PLACEHOLDER_SATS_PER_MATCH);
    assert_eq!(scanner.progress().matches(), 3);
}

#[tokio::test]
async fn test_scan_ignores_addresses_beyond_lookahead() {
    let chain = chain();
    let wallet = wallet_born_at(genesis());
    chain
        .set_block_scripts(20, &[script(&wallet, AddressKind::Receive, 21)])
        .unwrap();

    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());
    assert_eq!(scanner.address_scripts(&wallet).unwrap().len(), 42);
    assert_eq!(scanner.scan(&wallet).await.unwrap().utxo_count, 0);
}

#[tokio::test]
async fn test_address_space_follows_wallet_indices() {
    let chain = chain();
    let wallet = Wallet::new(Mnemonic::parse(ABANDON).unwrap(), "", "used", 4, 30, None)
        .unwrap()
        .with_created_at(genesis());
    chain
        .set_block_scripts(5, &[script(&wallet, AddressKind::Change, 30)])
        .unwrap();

    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());
    assert_eq!(scanner.address_scripts(&wallet).unwrap().len(), 62);
    assert_eq!(scanner.scan(&wallet).await.unwrap().utxo_count, 1);
}

#[tokio::test]
async fn test_failed_block_is_skipped() {
    let chain = chain();
    let wallet = wallet_born_at(block_time(40));
    let receive = script(&wallet, AddressKind::Receive, 1);
    chain.set_block_scripts(55, &[receive.clone()]).unwrap();
    chain.set_block_scripts(70, &[receive]).unwrap();
    chain.break_filter(55);

    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());
    let info = scanner.scan(&wallet).await.unwrap();

    assert_eq!(info.utxo_count, 1);
    let progress = scanner.progress();
    assert_eq!(progress.skipped(), 1);
    assert_eq!(progress.processed(), progress.total());
}

#[tokio::test]
async fn test_scan_is_capped_to_recent_blocks() {
    let chain = chain();
    let wallet = wallet_born_at(genesis());
    let receive = script(&wallet, AddressKind::Receive, 0);
    chain.set_block_scripts(85, &[receive.clone()]).unwrap();
    chain.set_block_scripts(95, &[receive]).unwrap();

    let config = ScanConfig {
        max_scan_blocks: 10,
        ..ScanConfig::default()
    };
    let scanner = BalanceScanner::new(chain.clone(), config);
    let info = scanner.scan(&wallet).await.unwrap();

    assert_eq!(info.utxo_count, 1);
    assert_eq!(scanner.progress().start_height(), 90);
    assert_eq!(scanner.progress().total(), 10);
}

#[tokio::test]
async fn test_progress_cadence() {
    let chain = chain();
    let wallet = wallet_born_at(block_time(40));
    let config = ScanConfig {
        progress_interval: 20,
        ..ScanConfig::default()
    };
    let scanner = BalanceScanner::new(chain.clone(), config);

    let updates = Mutex::new(Vec::new());
    scanner
        .scan_with_progress(&wallet, |update| {
            updates.lock().unwrap().push((update.processed, update.total, update.percent));
        })
        .await
        .unwrap();

    let updates = updates.into_inner().unwrap();
    let processed: Vec<u32> = updates.iter().map(|u| u.0).collect();
    assert_eq!(processed, vec![20, 40, 60, 61]);
    assert!(updates.iter().all(|u| u.1 == 61));
    assert_eq!(updates.last().unwrap().2, 100.0);
}

#[tokio::test]
async fn test_cancel_before_scan() {
    let chain = chain();
    let wallet = wallet_born_at(block_time(40));
    let cancel = CancelToken::new();
    cancel.cancel();

    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default()).with_cancel(cancel);
    let err = scanner.scan(&wallet).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(scanner.progress().processed(), 0);
}

#[tokio::test]
async fn test_cancel_mid_scan_stops_promptly() {
    let chain = chain();
    let wallet = wallet_born_at(genesis());
    let cancel = CancelToken::new();
    let config = ScanConfig {
        progress_interval: 10,
        ..ScanConfig::default()
    };
    let scanner = BalanceScanner::new(chain.clone(), config).with_cancel(cancel.clone());

    let err = scanner
        .scan_with_progress(&wallet, |_| cancel.cancel())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(scanner.progress().processed(), 10);
}

#[tokio::test]
async fn test_wallet_without_creation_time_is_invalid_state() {
    let chain = chain();
    let wallet = Wallet::new(Mnemonic::parse(ABANDON).unwrap(), "", "old", 0, 0, None).unwrap();

    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());
    let err = scanner.scan(&wallet).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_offline_chain_is_unavailable() {
    let chain = chain();
    chain.set_offline(true);
    let wallet = wallet_born_at(block_time(40));

    let scanner = BalanceScanner::new(chain.clone(), ScanConfig::default());
    let err = scanner.scan(&wallet).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChainUnavailable);
}
