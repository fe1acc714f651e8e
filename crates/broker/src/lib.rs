//! Pricebridge Broker Crate
//!
//! Downstream side of the bridge: wraps a Kafka producer behind the
//! [`PriceSink`] trait as an opaque ordered-publish primitive.
//!
//! # Guarantees
//!
//! - **Ordering**: at most one in-flight unacknowledged message
//!   (`max.in.flight.requests.per.connection=1`), so consumers observe
//!   envelopes in submission order.
//! - **Durability**: `acks=all` - a publish succeeds only once the broker's
//!   replica set has acknowledged it.
//! - **At-least-once**: acknowledgement ambiguity may produce duplicates;
//!   a failed publish is dropped, never re-queued, and the next tick
//!   submits a freshly fetched envelope.
//!
//! # Core Types
//!
//! - [`Envelope`] - The published message unit with provenance metadata
//! - [`PriceSink`] - Ordered-publish trait consumed by the controller
//! - [`KafkaSink`] - Kafka implementation with bounded connect retry
//! - [`BrokerError`] - Connection, publish and serialization failures

pub mod envelope;
pub mod errors;
pub mod kafka;
pub mod retry;
pub mod sink;

pub use envelope::{Envelope, ENVELOPE_STATUS_SUCCESS};
pub use errors::BrokerError;
pub use kafka::{KafkaConfig, KafkaSink};
pub use sink::{PriceSink, PublishReceipt};
