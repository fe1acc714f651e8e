//! Price sink trait definition.
//!
//! The seam between the loop controller and the broker client: the
//! controller sees an opaque ordered-publish primitive and nothing of the
//! wire protocol behind it.

use async_trait::async_trait;

use crate::envelope::Envelope;
use crate::errors::BrokerError;

/// Broker acknowledgement for a published envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Topic the envelope landed on
    pub topic: String,
    /// Partition assigned by the broker
    pub partition: i32,
    /// Offset assigned by the broker
    pub offset: i64,
}

/// Trait for ordered, acknowledged publishing.
///
/// Implementations must preserve submission order (at most one
/// unacknowledged message in flight) and must not report success before
/// the broker has durably acknowledged the message.
#[async_trait]
pub trait PriceSink: Send + Sync {
    /// Publish one envelope and wait (bounded) for acknowledgement.
    ///
    /// On error the envelope is considered lost for this tick; callers
    /// must not re-submit it.
    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, BrokerError>;

    /// Push every submitted-but-unacknowledged message to the broker (or
    /// fail loudly), then release the connection. Called exactly once, on
    /// the terminal transition out of the main loop.
    async fn flush_and_close(&self) -> Result<(), BrokerError>;
}
