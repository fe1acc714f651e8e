//! CoinGecko simple-price client.
//!
//! Issues one bounded-timeout GET per call against `/simple/price` and
//! classifies the result into a [`FetchOutcome`]. There is no retry in this
//! module; a failed attempt is reported and the next tick makes a fresh one.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::models::{AssetQuote, PriceSnapshot};
use crate::outcome::FetchOutcome;
use crate::traits::PriceFeed;

/// Constant identifying the upstream API in published envelopes.
pub const SOURCE_SYSTEM: &str = "coingecko_v3";

/// Endpoint path queried by this client.
pub const SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause served by the client itself after an HTTP 429, before the
/// controller's own inter-tick wait. Strictly speaking backoff timing
/// belongs to the controller; the in-component sleep is kept for
/// simplicity, matching the upstream producer it replaces.
const RATE_LIMIT_COURTESY_DELAY: Duration = Duration::from_secs(60);

/// CoinGecko `/simple/price` client.
///
/// Requests market cap, 24h volume, 24h change and the last-updated
/// timestamp for every asset id, quoted in a single currency.
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    courtesy_delay: Duration,
}

impl CoinGeckoClient {
    /// Create a new client for the given API base URL
    /// (e.g. `https://api.coingecko.com/api/v3`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            courtesy_delay: RATE_LIMIT_COURTESY_DELAY,
        }
    }

    /// Override the 429 courtesy delay. Used by tests.
    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoClient {
    fn source_system(&self) -> &'static str {
        SOURCE_SYSTEM
    }

    fn endpoint(&self) -> &'static str {
        SIMPLE_PRICE_ENDPOINT
    }

    async fn fetch(&self, asset_ids: &[String], vs_currency: &str) -> FetchOutcome {
        let url = format!("{}{}", self.base_url, SIMPLE_PRICE_ENDPOINT);
        let ids = asset_ids.join(",");

        debug!(%url, %ids, %vs_currency, "calling simple-price endpoint");

        let request = self.client.get(&url).query(&[
            ("ids", ids.as_str()),
            ("vs_currencies", vs_currency),
            ("include_market_cap", "true"),
            ("include_24hr_vol", "true"),
            ("include_24hr_change", "true"),
            ("include_last_updated_at", "true"),
        ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("upstream request timed out");
                return FetchOutcome::Retriable {
                    reason: "timeout".to_string(),
                };
            }
            Err(e) => {
                warn!(error = %e, "upstream request failed");
                return FetchOutcome::NonRetriable {
                    reason: format!("request failed: {e}"),
                };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                warn!("upstream response read timed out");
                return FetchOutcome::Retriable {
                    reason: "timeout".to_string(),
                };
            }
            Err(e) => {
                warn!(error = %e, "failed to read upstream response");
                return FetchOutcome::NonRetriable {
                    reason: format!("failed to read response: {e}"),
                };
            }
        };
        let fetched_at = Utc::now();

        let outcome = classify_response(status, &body, fetched_at, self.courtesy_delay);
        match &outcome {
            FetchOutcome::Success(snapshot) => {
                info!(assets = snapshot.data.len(), "fetched prices");
            }
            FetchOutcome::RateLimited { retry_after } => {
                warn!(
                    pause_secs = retry_after.as_secs(),
                    "upstream rate limit hit, pausing before returning"
                );
                tokio::time::sleep(*retry_after).await;
            }
            FetchOutcome::Retriable { reason } | FetchOutcome::NonRetriable { reason } => {
                warn!(%reason, "upstream returned an unusable response");
            }
        }
        outcome
    }
}

/// Classify an upstream response into a [`FetchOutcome`].
///
/// Policy, in priority order: 429 is rate limiting; any other non-2xx
/// status is non-retriable; an unparseable body is non-retriable
/// (`invalid_response`); everything else is a success. Treating generic
/// HTTP failures (5xx and the like) as non-retriable even though they are
/// often transient is deliberate: it preserves the long-standing behavior
/// of the producer this bridge replaces, where only timeouts were marked
/// for retry. Either way the controller keeps polling on its own interval.
pub fn classify_response(
    status: StatusCode,
    body: &str,
    fetched_at: DateTime<Utc>,
    courtesy_delay: Duration,
) -> FetchOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchOutcome::RateLimited {
            retry_after: courtesy_delay,
        };
    }

    if !status.is_success() {
        return FetchOutcome::NonRetriable {
            reason: format!("HTTP {status}"),
        };
    }

    match serde_json::from_str::<HashMap<String, AssetQuote>>(body) {
        Ok(data) => FetchOutcome::Success(PriceSnapshot {
            data,
            fetched_at,
            http_status: status.as_u16(),
        }),
        Err(e) => {
            debug!(error = %e, "simple-price body failed to parse");
            FetchOutcome::NonRetriable {
                reason: "invalid_response".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const COURTESY: Duration = Duration::from_secs(60);

    const FIXTURE: &str = r#"{
        "bitcoin": {
            "usd": 50000,
            "usd_market_cap": 1e12,
            "usd_24h_vol": 2e10,
            "usd_24h_change": 1.5,
            "last_updated_at": 1700000000
        }
    }"#;

    #[test]
    fn test_ok_body_classifies_as_success() {
        let fetched_at = Utc::now();
        let outcome = classify_response(StatusCode::OK, FIXTURE, fetched_at, COURTESY);

        let FetchOutcome::Success(snapshot) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(snapshot.http_status, 200);
        assert_eq!(snapshot.fetched_at, fetched_at);
        let bitcoin = &snapshot.data["bitcoin"];
        assert_eq!(bitcoin.usd, dec!(50000));
        assert_eq!(bitcoin.usd_24h_change, Some(dec!(1.5)));
        assert_eq!(bitcoin.last_updated_at, Some(1700000000));
    }

    #[test]
    fn test_429_classifies_as_rate_limited() {
        let outcome =
            classify_response(StatusCode::TOO_MANY_REQUESTS, "", Utc::now(), COURTESY);
        assert_eq!(
            outcome,
            FetchOutcome::RateLimited {
                retry_after: COURTESY
            }
        );
    }

    #[test]
    fn test_server_error_is_non_retriable() {
        // Preserved policy: 5xx does not classify as retriable.
        let outcome = classify_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "oops",
            Utc::now(),
            COURTESY,
        );
        assert!(matches!(
            outcome,
            FetchOutcome::NonRetriable { ref reason } if reason.contains("500")
        ));
    }

    #[test]
    fn test_unparseable_body_is_invalid_response() {
        let outcome = classify_response(StatusCode::OK, "<html>busy</html>", Utc::now(), COURTESY);
        assert_eq!(
            outcome,
            FetchOutcome::NonRetriable {
                reason: "invalid_response".to_string()
            }
        );
    }

    #[test]
    fn test_wrong_shape_body_is_invalid_response() {
        // Valid JSON, wrong structure: values must be per-asset quote objects.
        let outcome =
            classify_response(StatusCode::OK, r#"{"bitcoin": "fifty grand"}"#, Utc::now(), COURTESY);
        assert_eq!(
            outcome,
            FetchOutcome::NonRetriable {
                reason: "invalid_response".to_string()
            }
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = CoinGeckoClient::new("https://api.coingecko.com/api/v3/");
        assert_eq!(client.base_url, "https://api.coingecko.com/api/v3");
    }
}
