use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pricebridge_feed::{AssetQuote, PriceSnapshot};
use serde::{Deserialize, Serialize};

/// `status` value carried by every envelope. Only successful fetches are
/// published, so only this value ever appears on the wire.
pub const ENVELOPE_STATUS_SUCCESS: &str = "success";

/// The unit published to the broker: the raw fetch payload plus provenance.
///
/// `api_call_timestamp` is the instant the upstream call returned;
/// `ingestion_timestamp` is set when the envelope is built for publishing,
/// so the difference captures bridge-side latency. Envelopes are not
/// deduplicated - every successful tick yields exactly one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Fetch status, always [`ENVELOPE_STATUS_SUCCESS`]
    pub status: String,

    /// Per-asset quotes, passed through unmodified from upstream
    pub data: HashMap<String, AssetQuote>,

    /// When the upstream API call returned
    pub api_call_timestamp: DateTime<Utc>,

    /// HTTP status code of the upstream response
    pub http_status_code: u16,

    /// Constant identifying the upstream API (e.g. "coingecko_v3")
    pub source_system: String,

    /// Upstream endpoint path (e.g. "/simple/price")
    pub api_endpoint: String,

    /// When this envelope was built for publishing
    pub ingestion_timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Build an envelope from a successful fetch. This is the only
    /// constructor: a non-success outcome can never become an envelope.
    pub fn from_snapshot(
        snapshot: PriceSnapshot,
        source_system: &str,
        api_endpoint: &str,
    ) -> Self {
        Self {
            status: ENVELOPE_STATUS_SUCCESS.to_string(),
            data: snapshot.data,
            api_call_timestamp: snapshot.fetched_at,
            http_status_code: snapshot.http_status,
            source_system: source_system.to_string(),
            api_endpoint: api_endpoint.to_string(),
            ingestion_timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixture_snapshot() -> PriceSnapshot {
        let mut data = HashMap::new();
        data.insert(
            "bitcoin".to_string(),
            AssetQuote {
                usd: dec!(50000),
                usd_market_cap: Some(dec!(1000000000000)),
                usd_24h_vol: Some(dec!(20000000000)),
                usd_24h_change: Some(dec!(1.5)),
                last_updated_at: Some(1700000000),
            },
        );
        data.insert(
            "ethereum".to_string(),
            AssetQuote {
                usd: dec!(3100.25),
                usd_market_cap: Some(dec!(370000000000)),
                usd_24h_vol: Some(dec!(15000000000)),
                usd_24h_change: Some(dec!(-0.8)),
                last_updated_at: Some(1700000003),
            },
        );
        PriceSnapshot {
            data,
            fetched_at: Utc::now(),
            http_status: 200,
        }
    }

    #[test]
    fn test_ingestion_timestamp_not_before_api_call() {
        let envelope = Envelope::from_snapshot(fixture_snapshot(), "coingecko_v3", "/simple/price");
        assert!(envelope.ingestion_timestamp >= envelope.api_call_timestamp);
    }

    #[test]
    fn test_provenance_fields() {
        let envelope = Envelope::from_snapshot(fixture_snapshot(), "coingecko_v3", "/simple/price");
        assert_eq!(envelope.status, ENVELOPE_STATUS_SUCCESS);
        assert_eq!(envelope.source_system, "coingecko_v3");
        assert_eq!(envelope.api_endpoint, "/simple/price");
        assert_eq!(envelope.http_status_code, 200);
    }

    #[test]
    fn test_wire_round_trip_preserves_quote_fields() {
        let envelope = Envelope::from_snapshot(fixture_snapshot(), "coingecko_v3", "/simple/price");

        let wire = serde_json::to_vec(&envelope).unwrap();
        let parsed: Envelope = serde_json::from_slice(&wire).unwrap();

        assert_eq!(parsed.data.len(), envelope.data.len());
        for (asset_id, quote) in &envelope.data {
            assert_eq!(parsed.data.get(asset_id), Some(quote), "asset {asset_id}");
        }
        assert_eq!(parsed.source_system, envelope.source_system);
        assert_eq!(parsed.api_endpoint, envelope.api_endpoint);
        assert_eq!(parsed.http_status_code, envelope.http_status_code);
    }

    #[test]
    fn test_wire_shape_matches_topic_schema() {
        let envelope = Envelope::from_snapshot(fixture_snapshot(), "coingecko_v3", "/simple/price");
        let value: serde_json::Value = serde_json::to_value(&envelope).unwrap();

        for key in [
            "status",
            "data",
            "api_call_timestamp",
            "http_status_code",
            "source_system",
            "api_endpoint",
            "ingestion_timestamp",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert!(value["data"]["bitcoin"]["usd"].is_number());
    }
}
