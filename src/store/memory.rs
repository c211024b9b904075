// src/store/memory.rs
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{validate_key, Store, StoreError, StoreReader};

/// In-process store for tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("memory store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the stored value, if any.
    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .expect("memory store mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Sorted copy of every entry.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.inner
            .lock()
            .expect("memory store mutex poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Sorted list of stored keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .lock()
            .expect("memory store mutex poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn has_key(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self
            .inner
            .lock()
            .expect("memory store mutex poisoned")
            .contains_key(key))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        self.inner
            .lock()
            .expect("memory store mutex poisoned")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoreReader, StoreError> {
        validate_key(key)?;
        match self.value(key) {
            Some(v) => Ok(Box::pin(Cursor::new(v))),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }
}
