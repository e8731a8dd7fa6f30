//! End-to-end advertisement resolution scenarios.

use std::sync::Arc;
use std::time::Duration;

use crate::{client_info, handler_for, presence_advertising, FakePeer};

/// The same triple arrives twice concurrently with a cold cache. Exactly
/// one disco#info request reaches the peer, both handler invocations return
/// the same record, and a third advertisement after resolution costs zero
/// requests.
#[tokio::test]
async fn duplicate_advertisements_cost_one_request() {
    let info = client_info();
    // Slow peer so the second advertisement arrives while the first
    // fetch is still in flight.
    let peer = FakePeer::serving_slowly(info.clone(), Duration::from_millis(50));
    let handler = Arc::new(handler_for(peer.clone()));
    let presence = presence_advertising(
        "juliet@example.net/chamber",
        "https://example/client",
        &info,
    );

    let first = {
        let handler = Arc::clone(&handler);
        let presence = presence.clone();
        tokio::spawn(async move { handler.handle_presence(&presence).await })
    };
    let second = {
        let handler = Arc::clone(&handler);
        let presence = presence.clone();
        tokio::spawn(async move { handler.handle_presence(&presence).await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first, Some(info.clone()));
    assert_eq!(first, second);
    assert_eq!(peer.requests(), 1);

    // Third advertisement after resolution: pure cache hit.
    let third = handler.handle_presence(&presence).await.unwrap();
    assert_eq!(third, Some(info));
    assert_eq!(peer.requests(), 1);
}

/// Fifty tasks, one unseen fingerprint, one fetch.
#[tokio::test]
async fn advertisement_storm_deduplicates() {
    let info = client_info();
    let peer = FakePeer::serving_slowly(info.clone(), Duration::from_millis(50));
    let handler = Arc::new(handler_for(peer.clone()));
    let presence = presence_advertising(
        "juliet@example.net/chamber",
        "https://example/client",
        &info,
    );

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let handler = Arc::clone(&handler);
        let presence = presence.clone();
        tasks.push(tokio::spawn(
            async move { handler.handle_presence(&presence).await },
        ));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), Some(info.clone()));
    }

    assert_eq!(peer.requests(), 1);
    assert_eq!(handler.cache().len(), 1);
}

/// Different software versions of the same client get distinct cache
/// entries — the key is the whole `node#ver` pair.
#[tokio::test]
async fn distinct_fingerprints_get_distinct_entries() -> anyhow::Result<()> {
    let old_info = client_info();
    let mut new_info = client_info();
    new_info.features.push(beacon_core::Feature {
        var: "urn:xmpp:time".into(),
    });

    // Two peers each serve the record matching their own advertisement.
    let old_peer = FakePeer::serving(old_info.clone());
    let new_peer = FakePeer::serving(new_info.clone());

    let old_handler = handler_for(old_peer.clone());
    let new_handler = handler_for(new_peer.clone());

    let node = "https://example/client";
    let resolved_old = old_handler
        .handle_presence(&presence_advertising("a@example.net/pc", node, &old_info))
        .await?;
    let resolved_new = new_handler
        .handle_presence(&presence_advertising("b@example.net/pc", node, &new_info))
        .await?;

    assert_eq!(resolved_old, Some(old_info));
    assert_eq!(resolved_new, Some(new_info));
    assert_eq!(old_peer.requests(), 1);
    assert_eq!(new_peer.requests(), 1);
    Ok(())
}

/// A peer that serves a record not matching its advertised fingerprint is
/// rejected, and the bad reply never lands in the cache.
#[tokio::test]
async fn lying_peer_is_rejected_end_to_end() {
    let advertised = client_info();
    let mut served = client_info();
    served.features.clear();

    let peer = FakePeer::serving(served);
    let handler = handler_for(peer.clone());
    let presence = presence_advertising(
        "mallory@example.net/pc",
        "https://example/client",
        &advertised,
    );

    let err = handler.handle_presence(&presence).await.unwrap_err();
    assert!(matches!(err, beacon_disco::DiscoError::VerMismatch { .. }));
    assert!(handler.cache().is_empty());
    assert_eq!(peer.requests(), 1);
}
