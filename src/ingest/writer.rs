// src/ingest/writer.rs
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::ingest::observe::{IngestObserver, NoopObserver};
use crate::ingest::types::Item;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Stored,
    AlreadyPresent,
    Failed,
}

/// Deduplicates items against the store and writes missing ones.
///
/// The check-then-write sequence runs under `write_lock`; this is the only
/// place in the crate that writes to the store, which is what makes keys
/// write-once.
pub struct CacheWriter {
    store: Arc<dyn Store>,
    observer: Arc<dyn IngestObserver>,
    write_lock: Mutex<()>,
}

impl CacheWriter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            observer: Arc::new(NoopObserver),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn IngestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Never fails: errors are logged and reported as [`PutOutcome::Failed`].
    pub async fn put_item(&self, item: &Item) -> PutOutcome {
        let _guard = self.write_lock.lock().await;
        let key = item.key.as_str();

        match self.store.has_key(key).await {
            Ok(true) => {
                tracing::debug!(target: "ingest", %key, "key already exists, skipping");
                self.observer.item_already_present(key);
                return PutOutcome::AlreadyPresent;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(target: "ingest", %key, error = %e, "has_key failed");
                self.observer.store_failed(key, &e);
                return PutOutcome::Failed;
            }
        }

        match self.store.put(key, &item.body).await {
            Ok(()) => {
                tracing::info!(
                    target: "ingest",
                    %key,
                    bytes = item.body.len(),
                    "snapshot stored"
                );
                self.observer.item_stored(key);
                PutOutcome::Stored
            }
            Err(e) => {
                tracing::warn!(target: "ingest", %key, error = %e, "put failed");
                self.observer.store_failed(key, &e);
                PutOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn item(key: &str, body: &str) -> Item {
        Item {
            key: key.to_string(),
            timestamp: 0,
            body: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn second_put_with_same_key_is_a_noop() {
        let store = Arc::new(MemoryStore::new());
        let writer = CacheWriter::new(store.clone());

        assert_eq!(writer.put_item(&item("bazaar-1", "a")).await, PutOutcome::Stored);
        assert_eq!(
            writer.put_item(&item("bazaar-1", "b")).await,
            PutOutcome::AlreadyPresent
        );
        assert_eq!(store.value("bazaar-1").unwrap(), b"a".to_vec());
    }

    #[tokio::test]
    async fn invalid_key_is_reported_not_panicked() {
        let writer = CacheWriter::new(Arc::new(MemoryStore::new()));
        assert_eq!(writer.put_item(&item("../x", "a")).await, PutOutcome::Failed);
    }
}
