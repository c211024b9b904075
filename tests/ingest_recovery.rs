// tests/ingest_recovery.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Router};
use snapshot_cacher::ingest::providers::BazaarSource;
use snapshot_cacher::{CacheWriter, MemoryStore, Scheduler, SnapshotSource};
use tokio_util::sync::CancellationToken;

/// Bazaar endpoint that never answers its first request.
async fn bazaar_hangs_once(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
        std::future::pending::<()>().await;
    }
    include_str!("fixtures/bazaar.json")
}

#[tokio::test]
async fn feed_is_fetched_again_after_a_hung_request() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/skyblock/bazaar", get(bazaar_hangs_once))
        .with_state(hits.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let source: Arc<dyn SnapshotSource> = Arc::new(BazaarSource::from_url(
        format!("http://{addr}/skyblock/bazaar"),
        reqwest::Client::new(),
    ));
    let store = Arc::new(MemoryStore::new());
    let writer = Arc::new(CacheWriter::new(store.clone()));
    let sched = Scheduler::new(vec![source], writer)
        .with_period(Duration::from_millis(50))
        .with_fetch_timeout(Duration::from_millis(100));

    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        stop.cancel();
    });
    tokio::time::timeout(Duration::from_secs(5), sched.run(cancel))
        .await
        .expect("scheduler should stop after cancel");

    assert!(hits.load(Ordering::SeqCst) >= 2, "feed was never fetched again");
    assert_eq!(store.keys(), vec!["bazaar-100".to_string()]);
}
