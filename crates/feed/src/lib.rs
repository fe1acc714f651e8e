//! Pricebridge Feed Crate
//!
//! Upstream side of the bridge: fetches simple-price snapshots from the
//! CoinGecko API and classifies each attempt into a [`FetchOutcome`].
//!
//! # Overview
//!
//! - One bounded-timeout HTTP request per call, no internal retry; retry
//!   timing belongs to the loop controller that consumes the outcome.
//! - Classification is a pure function over status code and body, so the
//!   policy is testable without a network.
//!
//! # Core Types
//!
//! - [`PriceFeed`] - The trait the controller polls each tick
//! - [`CoinGeckoClient`] - CoinGecko `/simple/price` implementation
//! - [`FetchOutcome`] - Success / RateLimited / Retriable / NonRetriable
//! - [`AssetQuote`] - One asset's price entry, passed through unmodified
//! - [`PriceSnapshot`] - Parsed per-asset quotes plus fetch provenance

pub mod coingecko;
pub mod models;
pub mod outcome;
pub mod traits;

pub use coingecko::{CoinGeckoClient, SIMPLE_PRICE_ENDPOINT, SOURCE_SYSTEM};
pub use models::{AssetQuote, PriceSnapshot};
pub use outcome::FetchOutcome;
pub use traits::PriceFeed;
