// src/lib.rs
//! Periodic snapshot cacher: fetches feeds on a schedule and stores every
//! distinct `<source>-<lastUpdated>` snapshot exactly once.

pub mod ingest;
pub mod metrics;
pub mod store;

pub use crate::ingest::observe::{IngestObserver, MetricsObserver, NoopObserver};
pub use crate::ingest::scheduler::{CycleReport, Scheduler};
pub use crate::ingest::types::{FetchError, Item, SnapshotSource};
pub use crate::ingest::writer::{CacheWriter, PutOutcome};
pub use crate::store::{FileStore, MemoryStore, Store, StoreError};
