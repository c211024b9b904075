// src/ingest/providers/election.rs
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::Envelope;

/// Current mayor plus the election in progress, if any.
#[derive(Debug, Serialize, Deserialize)]
pub struct ElectionEnvelope {
    pub success: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    #[serde(default)]
    pub mayor: Option<Box<RawValue>>,
    #[serde(default)]
    pub current: Option<Box<RawValue>>,
}

impl Envelope for ElectionEnvelope {
    const SOURCE: &'static str = "election";
    const DEFAULT_URL: &'static str = "https://api.hypixel.net/resources/skyblock/election";

    fn success(&self) -> bool {
        self.success
    }

    fn last_updated(&self) -> i64 {
        self.last_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::parse_item;

    #[test]
    fn no_election_in_progress() {
        let raw = br#"{"success":true,"lastUpdated":42,"mayor":{"name":"Diana"}}"#;
        let item = parse_item::<ElectionEnvelope>(raw).unwrap();
        assert_eq!(item.key, "election-42");
        let back: ElectionEnvelope = serde_json::from_slice(&item.body).unwrap();
        assert!(back.current.is_none());
        assert_eq!(back.mayor.as_ref().map(|m| m.get()), Some(r#"{"name":"Diana"}"#));
    }

    #[test]
    fn missing_mayor_is_stored_as_null() {
        let item = parse_item::<ElectionEnvelope>(br#"{"success":true,"lastUpdated":9}"#).unwrap();
        assert_eq!(
            item.body,
            br#"{"success":true,"lastUpdated":9,"mayor":null,"current":null}"#.to_vec()
        );
    }
}
