//! Environment configuration for the producer.
//!
//! Every knob is optional and defaulted, so the binary runs against a
//! local stack with no configuration at all.

use std::time::Duration;

use tracing::warn;

/// Default poll interval when `API_INTERVAL_SECONDS` is absent or invalid.
const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Quote currency for every request. Fixed rather than configurable: the
/// topic schema hardcodes usd-denominated field names.
const VS_CURRENCY: &str = "usd";

/// Runtime configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Kafka bootstrap address list (`KAFKA_BOOTSTRAP_SERVERS`)
    pub kafka_brokers: String,
    /// Topic envelopes are published to (`KAFKA_TOPIC`)
    pub kafka_topic: String,
    /// Inter-tick wait (`API_INTERVAL_SECONDS`)
    pub poll_interval: Duration,
    /// Upstream API base URL (`COINGECKO_API_URL`)
    pub api_base_url: String,
    /// Tracked asset ids (`CRYPTO_IDS`, comma-separated)
    pub asset_ids: Vec<String>,
    /// Quote currency, always "usd"
    pub vs_currency: String,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            kafka_brokers: env_or("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
            kafka_topic: env_or("KAFKA_TOPIC", "crypto.prices.raw"),
            poll_interval: parse_interval_secs(&env_or(
                "API_INTERVAL_SECONDS",
                &DEFAULT_INTERVAL_SECS.to_string(),
            )),
            api_base_url: env_or("COINGECKO_API_URL", "https://api.coingecko.com/api/v3"),
            asset_ids: parse_asset_ids(&env_or("CRYPTO_IDS", "bitcoin,ethereum")),
            vs_currency: VS_CURRENCY.to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_interval_secs(raw: &str) -> Duration {
    let secs = raw.parse().unwrap_or_else(|_| {
        warn!(value = %raw, "invalid API_INTERVAL_SECONDS, using default");
        DEFAULT_INTERVAL_SECS
    });
    Duration::from_secs(secs)
}

fn parse_asset_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
