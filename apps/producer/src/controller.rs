//! The fetch/classify/publish control loop.
//!
//! One logical task drives everything: fetch an outcome, run it through
//! the decision table, optionally publish, then sleep until the next tick.
//! The sleep is a `select!` over the timer and the shutdown token, so a
//! signal interrupts it immediately instead of running the interval out.
//! Fetch and publish latency are fully serialized; with a multi-second
//! polling interval that costs nothing and removes any need for locking.

use std::sync::Arc;
use std::time::Duration;

use pricebridge_broker::{Envelope, PriceSink};
use pricebridge_feed::{FetchOutcome, PriceFeed, PriceSnapshot};
use tracing::{error, info, warn};

use crate::shutdown::ShutdownToken;

/// Knobs the controller needs; derived from [`Config`](crate::config::Config).
#[derive(Clone, Debug)]
pub struct ControllerSettings {
    /// Inter-tick wait
    pub poll_interval: Duration,
    /// Tracked asset ids
    pub asset_ids: Vec<String>,
    /// Quote currency
    pub vs_currency: String,
}

/// Where the loop currently is.
///
/// `Running` covers the fetch/decide/publish sequence, `Sleeping` the
/// inter-tick wait. A shutdown request observed at either point moves to
/// `ShuttingDown`, and the loop always ends in `Terminated`, where the
/// final flush happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Sleeping,
    ShuttingDown,
    Terminated,
}

/// What one tick does with a fetch outcome.
#[derive(Debug)]
pub enum TickAction {
    /// Publish an envelope built from this snapshot.
    Publish(PriceSnapshot),
    /// Skip publishing; log and wait for the next tick.
    Skip {
        reason: String,
        /// Log at error level (non-retriable failures) instead of warn.
        error_level: bool,
    },
}

/// The decision table: maps every fetch outcome to a tick action.
///
/// Nothing here ends the process. A non-retriable outcome is tick-fatal
/// only; the loop keeps polling on its normal interval.
pub fn decide(outcome: FetchOutcome) -> TickAction {
    match outcome {
        FetchOutcome::Success(snapshot) => TickAction::Publish(snapshot),
        FetchOutcome::RateLimited { retry_after } => TickAction::Skip {
            reason: format!(
                "rate limited, courtesy pause of {}s already served",
                retry_after.as_secs()
            ),
            error_level: false,
        },
        FetchOutcome::Retriable { reason } => TickAction::Skip {
            reason: format!("{reason}; retrying next tick"),
            error_level: false,
        },
        FetchOutcome::NonRetriable { reason } => TickAction::Skip {
            reason,
            error_level: true,
        },
    }
}

/// Owns the timer, the shutdown token, and the decision table.
pub struct Controller {
    feed: Arc<dyn PriceFeed>,
    sink: Arc<dyn PriceSink>,
    settings: ControllerSettings,
    shutdown: ShutdownToken,
    state: LoopState,
    iterations: u64,
}

impl Controller {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        sink: Arc<dyn PriceSink>,
        settings: ControllerSettings,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            feed,
            sink,
            settings,
            shutdown,
            state: LoopState::Running,
            iterations: 0,
        }
    }

    /// Run ticks until shutdown is requested or a tick fails in a way the
    /// decision table does not cover. Always flushes and closes the sink
    /// exactly once before returning, on every exit path.
    pub async fn run(mut self) -> LoopState {
        while !self.shutdown.is_shutdown() {
            self.state = LoopState::Running;
            self.iterations += 1;
            info!(iteration = self.iterations, "tick started");

            if let Err(e) = self.tick().await {
                // A failure the classification did not absorb. Stopping
                // loudly beats looping in an unobservable broken state.
                error!(error = ?e, "unexpected error in tick, stopping loop");
                break;
            }

            if self.shutdown.is_shutdown() {
                self.state = LoopState::ShuttingDown;
                break;
            }

            self.state = LoopState::Sleeping;
            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = self.shutdown.cancelled() => {
                    self.state = LoopState::ShuttingDown;
                    break;
                }
            }
        }

        self.state = LoopState::Terminated;
        info!(
            iterations = self.iterations,
            "loop terminated, flushing pending messages"
        );
        if let Err(e) = self.sink.flush_and_close().await {
            warn!(error = %e, "flush on shutdown failed");
        }
        self.state
    }

    async fn tick(&mut self) -> anyhow::Result<()> {
        let outcome = self
            .feed
            .fetch(&self.settings.asset_ids, &self.settings.vs_currency)
            .await;

        match decide(outcome) {
            TickAction::Publish(snapshot) => {
                let envelope = Envelope::from_snapshot(
                    snapshot,
                    self.feed.source_system(),
                    self.feed.endpoint(),
                );
                match self.sink.publish(&envelope).await {
                    Ok(receipt) => info!(
                        topic = %receipt.topic,
                        partition = receipt.partition,
                        offset = receipt.offset,
                        "envelope acknowledged"
                    ),
                    // The envelope is lost for this tick; the next tick
                    // fetches and publishes fresh data instead.
                    Err(e) => warn!(error = %e, "publish failed, dropping this tick's envelope"),
                }
            }
            TickAction::Skip {
                reason,
                error_level: true,
            } => error!(%reason, "skipping publish"),
            TickAction::Skip {
                reason,
                error_level: false,
            } => warn!(%reason, "skipping publish"),
        }
        Ok(())
    }
}
