use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the broker side of the bridge.
///
/// Only `ConnectExhausted` is process-fatal: it propagates out of startup
/// and terminates the process with a non-zero status. Everything else is
/// per-message - the controller logs it and moves on to the next tick.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// A single connection attempt failed. Retried with fixed backoff
    /// up to the configured attempt count.
    #[error("broker connection failed: {0}")]
    Connect(String),

    /// All connection attempts failed. Fatal at startup.
    #[error("broker connection failed after {attempts} attempts: {last}")]
    ConnectExhausted {
        /// How many attempts were made
        attempts: u32,
        /// The error from the final attempt
        last: String,
    },

    /// The broker rejected or failed to deliver a message.
    /// The envelope is dropped; the next tick publishes fresh data.
    #[error("publish failed: {0}")]
    Publish(String),

    /// The broker did not acknowledge the message within the bounded wait.
    /// Delivery is ambiguous - the message may or may not land, which is
    /// why exactly-once is not claimed.
    #[error("broker did not acknowledge within {0:?}")]
    AckTimeout(Duration),

    /// The envelope could not be serialized to the wire payload.
    #[error("envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
