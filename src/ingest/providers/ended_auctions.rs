// src/ingest/providers/ended_auctions.rs
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::Envelope;

/// Auctions that ended in the last minute. Records are kept opaque.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndedAuctionsEnvelope {
    pub success: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    #[serde(default)]
    pub auctions: Vec<Box<RawValue>>,
}

impl Envelope for EndedAuctionsEnvelope {
    const SOURCE: &'static str = "ended-auctions";
    const DEFAULT_URL: &'static str = "https://api.hypixel.net/skyblock/auctions_ended";

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
    fn auction_records_survive_reserialization() {
        let raw = r#"{ "success": true, "lastUpdated": 1700000000000,
            "auctions": [ {"auction_id":"a1","price":  100, "bin":true}, {"auction_id":"a2"} ] }"#;
        let item = parse_item::<EndedAuctionsEnvelope>(raw.as_bytes()).unwrap();
        assert_eq!(item.key, "ended-auctions-1700000000000");

        let back: EndedAuctionsEnvelope = serde_json::from_slice(&item.body).unwrap();
        assert_eq!(back.auctions.len(), 2);
        assert_eq!(
            back.auctions[0].get(),
            r#"{"auction_id":"a1","price":  100, "bin":true}"#
        );
    }

    #[test]
    fn missing_auctions_field_is_empty_list() {
        let item =
            parse_item::<EndedAuctionsEnvelope>(br#"{"success":true,"lastUpdated":3}"#).unwrap();
        assert_eq!(
            item.body,
            br#"{"success":true,"lastUpdated":3,"auctions":[]}"#.to_vec()
        );
    }
}
