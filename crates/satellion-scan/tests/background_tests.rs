//! Background scan task

use chrono::{DateTime, Duration, Utc};
use satellion_core::{AddressKind, Mnemonic, Wallet};
use satellion_scan::testing::MemoryChain;
use satellion_scan::{spawn_balance_scan, BackgroundScanConfig, CancelToken, Error, ScanStage};
use std::sync::Arc;

const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

// Thirty blocks ten minutes apart, the tip ten minutes old
fn genesis() -> DateTime<Utc> {
    Utc::now() - Duration::minutes(300)
}

fn wallet(born: DateTime<Utc>) -> Wallet {
    Wallet::new(Mnemonic::parse(ABANDON).unwrap(), "", "bg", 0, 0, None)
        .unwrap()
        .with_created_at(born)
}

fn chain(wallet: &Wallet, genesis: DateTime<Utc>) -> Arc<MemoryChain> {
    let chain = MemoryChain::with_blocks(30, genesis, Duration::minutes(10)).unwrap();
    let receive = wallet.address(AddressKind::Receive, 2).unwrap().script_pubkey();
    chain.set_block_scripts(12, &[receive]).unwrap();
    Arc::new(chain)
}

#[tokio::test]
async fn test_background_scan_completes_once_synced() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let genesis = genesis();
    let wallet = wallet(genesis);
    let chain = chain(&wallet, genesis);
    chain.set_connected_peers(5);
    chain.set_synced(true);

    let handle = spawn_balance_scan(
        chain.clone(),
        wallet,
        BackgroundScanConfig::default(),
        CancelToken::new(),
    );
    let updates = handle.updates();

    let info = handle.join().await.unwrap();
    assert_eq!(info.utxo_count, 1);
    assert_eq!(info.balance, 1_000);

    let last = updates.borrow().clone();
    assert_eq!(last.stage, ScanStage::Complete);
    assert_eq!(last.processed, 30);
    assert_eq!(last.percent, 100.0);
}

#[tokio::test]
async fn test_background_scan_cancelled_while_waiting() {
    let genesis = genesis();
    let wallet = wallet(genesis);
    let chain = chain(&wallet, genesis);

    let handle = spawn_balance_scan(
        chain.clone(),
        wallet,
        BackgroundScanConfig::default(),
        CancelToken::new(),
    );
    assert_eq!(handle.latest().stage, ScanStage::WaitingForSync);

    handle.cancel();
    let err = handle.join().await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[test]
fn test_background_config_defaults_from_partial_json() {
    let config: BackgroundScanConfig =
        serde_json::from_str(r#"{"scan":{"max_scan_blocks":100}}"#).unwrap();
    assert_eq!(config.scan.max_scan_blocks, 100);
    assert_eq!(config.scan.progress_interval, 1_000);
    assert_eq!(config.chain.min_peers, 5);
}
