// src/ingest/observe.rs
//! Injectable observability hook for the ingest pipeline.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::FetchError;
use crate::store::StoreError;

/// Receives one call per pipeline event. All methods default to no-ops so
/// implementors only override what they care about.
pub trait IngestObserver: Send + Sync {
    fn fetch_succeeded(&self, _source: &str, _key: &str) {}
    fn fetch_failed(&self, _source: &str, _err: &FetchError) {}
    /// Previous fetch for `source` still in flight, tick skipped.
    fn fetch_skipped(&self, _source: &str) {}
    fn item_stored(&self, _key: &str) {}
    fn item_already_present(&self, _key: &str) {}
    fn store_failed(&self, _key: &str, _err: &StoreError) {}
    fn cycle_started(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl IngestObserver for NoopObserver {}

/// Forwards events to the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl MetricsObserver {
    pub fn new() -> Self {
        ensure_metrics_described();
        Self
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "snapshot_fetch_total",
            "Feed fetches by source and outcome."
        );
        describe_counter!(
            "snapshot_fetch_skipped_total",
            "Ticks skipped because the previous fetch was still running."
        );
        describe_counter!(
            "snapshot_write_total",
            "Cache writer results: stored, present, failed."
        );
        describe_gauge!(
            "snapshot_last_cycle_ts",
            "Unix ts when the last fetch cycle started."
        );
    });
}

impl IngestObserver for MetricsObserver {
    fn fetch_succeeded(&self, source: &str, _key: &str) {
        counter!("snapshot_fetch_total", "source" => source.to_string(), "outcome" => "ok")
            .increment(1);
    }

    fn fetch_failed(&self, source: &str, err: &FetchError) {
        counter!(
            "snapshot_fetch_total",
            "source" => source.to_string(),
            "outcome" => err.kind()
        )
        .increment(1);
    }

    fn fetch_skipped(&self, source: &str) {
        counter!("snapshot_fetch_skipped_total", "source" => source.to_string()).increment(1);
    }

    fn item_stored(&self, _key: &str) {
        counter!("snapshot_write_total", "outcome" => "stored").increment(1);
    }

    fn item_already_present(&self, _key: &str) {
        counter!("snapshot_write_total", "outcome" => "present").increment(1);
    }

    fn store_failed(&self, _key: &str, _err: &StoreError) {
        counter!("snapshot_write_total", "outcome" => "failed").increment(1);
    }

    fn cycle_started(&self) {
        let now = chrono::Utc::now().timestamp().max(0);
        gauge!("snapshot_last_cycle_ts").set(now as f64);
    }
}
