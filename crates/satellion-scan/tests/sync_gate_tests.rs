//! Readiness gate polling

use chrono::Utc;
use satellion_scan::testing::MemoryChain;
use satellion_scan::{CancelToken, ChainConfig, Error, SyncGate};
use std::sync::Arc;
use std::time::Duration;

fn fresh_chain(peers: u32) -> Arc<MemoryChain> {
    let chain = MemoryChain::new();
    chain.push_block(Utc::now(), &[]).unwrap();
    chain.set_connected_peers(peers);
    chain.set_synced(true);
    Arc::new(chain)
}

#[tokio::test]
async fn test_ready_chain_passes_immediately() {
    let chain = fresh_chain(5);
    let gate = SyncGate::default();
    let best = gate
        .wait_until_synced(chain.as_ref(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(best.height, 0);
    assert_eq!(best.connected_peers, 5);
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_peers() {
    let chain = fresh_chain(1);
    let gate = SyncGate::new(ChainConfig {
        min_peers: 3,
        ..ChainConfig::default()
    });

    let later = chain.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        later.set_connected_peers(3);
    });

    let best = gate
        .wait_until_synced(chain.as_ref(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(best.connected_peers, 3);
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_client_to_report_synced() {
    let chain = fresh_chain(8);
    chain.set_synced(false);

    let gate = SyncGate::default();
    assert!(gate.check(chain.as_ref()).await.unwrap().is_none());

    let later = chain.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        later.set_synced(true);
    });

    gate.wait_until_synced(chain.as_ref(), &CancelToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stale_tip_is_not_ready_even_when_synced() {
    let chain = MemoryChain::new();
    chain
        .push_block(Utc::now() - chrono::Duration::hours(2), &[])
        .unwrap();
    chain.set_connected_peers(8);
    chain.set_synced(true);

    let gate = SyncGate::default();
    assert!(gate.check(&chain).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_chain_errors_keep_polling() {
    let chain = fresh_chain(5);
    chain.set_offline(true);

    let later = chain.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        later.set_offline(false);
    });

    SyncGate::default()
        .wait_until_synced(chain.as_ref(), &CancelToken::new())
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_waiting() {
    let chain = fresh_chain(0);
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        trigger.cancel();
    });

    let err = SyncGate::default()
        .wait_until_synced(chain.as_ref(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_check_reports_unavailable_chain() {
    let chain = fresh_chain(5);
    chain.set_offline(true);
    let err = SyncGate::default().check(chain.as_ref()).await.unwrap_err();
    assert!(matches!(err, Error::ChainUnavailable(_)));
}
