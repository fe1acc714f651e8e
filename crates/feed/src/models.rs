use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One asset's simple-price entry as returned by the upstream API.
///
/// The payload is opaque to the bridge: fields are parsed only to validate
/// the response shape and are forwarded unmodified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetQuote {
    /// Price in the quote currency
    pub usd: Decimal,

    /// Market capitalization (present when requested via include flag)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_market_cap: Option<Decimal>,

    /// 24-hour trading volume
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_24h_vol: Option<Decimal>,

    /// 24-hour price change, percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_24h_change: Option<Decimal>,

    /// Upstream-reported last-updated time (unix seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<i64>,
}

/// A parsed price snapshot: per-asset quotes plus fetch provenance.
///
/// Produced only from a successful, well-formed upstream response.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSnapshot {
    /// Upstream response body keyed by asset id, passed through unmodified
    pub data: HashMap<String, AssetQuote>,

    /// The instant the API call returned
    pub fetched_at: DateTime<Utc>,

    /// HTTP status code of the upstream response
    pub http_status: u16,
}
