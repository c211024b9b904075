// src/ingest/providers/bazaar.rs
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::Envelope;

#[derive(Debug, Serialize, Deserialize)]
pub struct BazaarEnvelope {
    pub success: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    #[serde(default)]
    pub products: Option<Box<RawValue>>,
}

impl Envelope for BazaarEnvelope {
    const SOURCE: &'static str = "bazaar";
    const DEFAULT_URL: &'static str = "https://api.hypixel.net/skyblock/bazaar";

    fn success(&self) -> bool {
        self.success
    }

    fn last_updated(&self) -> i64 {
        self.last_updated
    }
}
