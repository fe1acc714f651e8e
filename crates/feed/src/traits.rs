//! Price feed trait definition.
//!
//! This is the seam between the upstream API client and the loop
//! controller: the controller polls a `PriceFeed` once per tick and acts on
//! the returned [`FetchOutcome`].

use async_trait::async_trait;

use crate::outcome::FetchOutcome;

/// Trait for upstream price sources.
///
/// Implementations make exactly one attempt per call and classify the
/// result; they never retry internally. Retry timing is entirely the
/// caller's responsibility.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Constant identifying the upstream system, recorded in every
    /// published envelope (e.g. "coingecko_v3").
    fn source_system(&self) -> &'static str;

    /// Upstream endpoint path, recorded in every published envelope.
    fn endpoint(&self) -> &'static str;

    /// Fetch one simple-price snapshot for the given asset ids.
    ///
    /// # Arguments
    ///
    /// * `asset_ids` - Upstream asset identifiers (e.g. "bitcoin")
    /// * `vs_currency` - Quote currency (e.g. "usd")
    ///
    /// # Returns
    ///
    /// A classified [`FetchOutcome`]; never an error. Every failure mode is
    /// folded into the outcome so the controller's decision table is total.
    async fn fetch(&self, asset_ids: &[String], vs_currency: &str) -> FetchOutcome;
}
