// src/store/mod.rs
//! Durable key-value persistence for fetched snapshots.
//!
//! The [`Store`] trait is the only surface collaborators see: existence
//! checks, writes and streaming reads. Write-once semantics are enforced by
//! the caller ([`crate::ingest::writer::CacheWriter`]), not by the store.

pub mod file;
pub mod memory;

use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Readable handle returned by [`Store::get`].
pub type StoreReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Side-effect free existence check.
    async fn has_key(&self, key: &str) -> Result<bool, StoreError>;

    /// Write `value` under `key`, replacing whatever is there.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<StoreReader, StoreError>;
}

/// Keys map 1:1 onto file names, so they must stay inside the store root.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
