// src/ingest/types.rs
use serde::Serialize;

/// One fetched snapshot, ready for the cache writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: String,    // "<source>-<timestamp>"
    pub timestamp: i64, // source-reported lastUpdated
    pub body: Vec<u8>,  // re-serialized envelope
}

impl Item {
    /// Build an item from a parsed envelope. The key depends only on
    /// `source` and `timestamp`, never on the payload.
    pub fn from_envelope<E: Serialize>(
        source: &str,
        timestamp: i64,
        envelope: &E,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            key: snapshot_key(source, timestamp),
            timestamp,
            body: serde_json::to_vec(envelope)?,
        })
    }
}

pub fn snapshot_key(source: &str, timestamp: i64) -> String {
    format!("{source}-{timestamp}")
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("malformed {feed} envelope: {source}")]
    Decode {
        feed: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{feed} envelope reported success=false")]
    Unsuccessful { feed: &'static str },
    #[error("re-serializing {feed} envelope: {source}")]
    Encode {
        feed: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{feed} fetch gave up after {after:?}")]
    Timeout {
        feed: &'static str,
        after: std::time::Duration,
    },
}

impl FetchError {
    /// Short label used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Decode { .. } => "decode",
            FetchError::Unsuccessful { .. } => "unsuccessful",
            FetchError::Encode { .. } => "encode",
            FetchError::Timeout { .. } => "timeout",
        }
    }
}

#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Source name, also the key prefix.
    fn name(&self) -> &'static str;

    /// Exactly one request, no retries. The next tick retries naturally.
    async fn fetch(&self) -> Result<Item, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_payload() {
        let a = Item::from_envelope("bazaar", 100, &serde_json::json!({"p": 1})).unwrap();
        let b = Item::from_envelope("bazaar", 100, &serde_json::json!({"p": 2})).unwrap();
        assert_eq!(a.key, "bazaar-100");
        assert_eq!(a.key, b.key);
        assert_ne!(a.body, b.body);
    }

    #[test]
    fn serialization_is_stable() {
        let env = serde_json::json!({"success": true, "lastUpdated": 5});
        let a = Item::from_envelope("election", 5, &env).unwrap();
        let b = Item::from_envelope("election", 5, &env).unwrap();
        assert_eq!(a, b);
    }
}
