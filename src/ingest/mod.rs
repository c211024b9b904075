// src/ingest/mod.rs
pub mod config;
pub mod observe;
pub mod providers;
pub mod scheduler;
pub mod types;
pub mod writer;

use std::sync::Arc;

use crate::ingest::config::{FeedKind, IngestConfig};
use crate::ingest::observe::IngestObserver;
use crate::ingest::providers::{BazaarSource, ElectionSource, EndedAuctionsSource};
use crate::ingest::scheduler::Scheduler;
use crate::ingest::types::SnapshotSource;
use crate::ingest::writer::CacheWriter;
use crate::store::Store;

pub use types::{snapshot_key, FetchError, Item};

/// One HTTP source per enabled feed, all sharing `client`.
pub fn build_sources(cfg: &IngestConfig, client: &reqwest::Client) -> Vec<Arc<dyn SnapshotSource>> {
    cfg.enabled_feeds()
        .map(|feed| {
            let url = feed.endpoint().to_string();
            let client = client.clone();
            let source: Arc<dyn SnapshotSource> = match feed.kind {
                FeedKind::EndedAuctions => Arc::new(EndedAuctionsSource::from_url(url, client)),
                FeedKind::Bazaar => Arc::new(BazaarSource::from_url(url, client)),
                FeedKind::Election => Arc::new(ElectionSource::from_url(url, client)),
            };
            source
        })
        .collect()
}

/// Wire writer and scheduler for `cfg` with a single observer shared by both.
pub fn build_scheduler(
    cfg: &IngestConfig,
    store: Arc<dyn Store>,
    client: &reqwest::Client,
    observer: Arc<dyn IngestObserver>,
) -> Scheduler {
    let writer = Arc::new(CacheWriter::new(store).with_observer(observer.clone()));
    Scheduler::new(build_sources(cfg, client), writer)
        .with_period(cfg.period())
        .with_fetch_timeout(cfg.fetch_timeout())
        .with_observer(observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::config::FeedConfig;

    #[test]
    fn disabled_feeds_get_no_source() {
        let mut cfg = IngestConfig::default();
        cfg.feeds[0].enabled = false;
        let sources = build_sources(&cfg, &reqwest::Client::new());
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["bazaar", "election"]);
    }

    #[test]
    fn scheduler_uses_configured_period() {
        let cfg = IngestConfig {
            period_secs: 3,
            fetch_timeout_secs: Some(2),
            feeds: vec![FeedConfig {
                kind: FeedKind::Election,
                url: Some("http://127.0.0.1:1/election".into()),
                enabled: true,
            }],
            ..IngestConfig::default()
        };
        let sched = build_scheduler(
            &cfg,
            Arc::new(crate::store::MemoryStore::new()),
            &reqwest::Client::new(),
            Arc::new(observe::NoopObserver),
        );
        assert_eq!(sched.period().as_secs(), 3);
        assert_eq!(sched.fetch_timeout().as_secs(), 2);
        assert_eq!(sched.source_names(), vec!["election"]);
    }
}
