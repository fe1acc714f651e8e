//! Kafka implementation of the ordered-publish primitive.
//!
//! The producer is configured for strict per-partition ordering (one
//! in-flight unacknowledged message) and full-replica durability
//! (`acks=all`), trading latency for a hard ordering + durability
//! guarantee. Acceptable here: the polling interval is multi-second and
//! each tick publishes a single envelope.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use tracing::{debug, info};

use crate::envelope::Envelope;
use crate::errors::BrokerError;
use crate::retry::connect_with_retry;
use crate::sink::{PriceSink, PublishReceipt};

/// Connection attempts before giving up (process-fatal).
const CONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay between connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Bounded wait for broker acknowledgement of one message.
const ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded wait for the final flush on shutdown.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded wait for the connect-time metadata probe.
const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for [`KafkaSink`].
#[derive(Clone, Debug)]
pub struct KafkaConfig {
    /// Bootstrap broker address list, e.g. "localhost:9092"
    pub brokers: String,
    /// Topic every envelope is published to
    pub topic: String,
}

/// Kafka-backed [`PriceSink`].
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaSink {
    /// Connect to the broker, retrying up to 5 times with a fixed 5-second
    /// delay. Exhausting the retries returns
    /// [`BrokerError::ConnectExhausted`], which callers propagate to
    /// process exit with non-zero status.
    pub async fn connect(config: KafkaConfig) -> Result<Self, BrokerError> {
        let brokers = config.brokers.clone();
        let producer = connect_with_retry(CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY, move |attempt| {
            let brokers = brokers.clone();
            async move {
                debug!(attempt, %brokers, "connecting to Kafka");
                Self::try_connect(&brokers).await
            }
        })
        .await?;

        info!(brokers = %config.brokers, topic = %config.topic, "connected to Kafka");
        Ok(Self {
            producer,
            topic: config.topic,
        })
    }

    async fn try_connect(brokers: &str) -> Result<FutureProducer, BrokerError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            // Wait for the full replica set to acknowledge each message.
            .set("acks", "all")
            // One unacknowledged message at a time preserves ordering.
            .set("max.in.flight.requests.per.connection", "1")
            .set("message.timeout.ms", ACK_TIMEOUT.as_millis().to_string())
            .create()
            .map_err(|e| BrokerError::Connect(e.to_string()))?;

        // Producer creation never touches the network; probe cluster
        // metadata so unreachable brokers fail the connect attempt here
        // rather than on the first publish. librdkafka's metadata call
        // blocks, hence spawn_blocking.
        let probe = producer.clone();
        tokio::task::spawn_blocking(move || {
            probe
                .client()
                .fetch_metadata(None, METADATA_TIMEOUT)
                .map(|_| ())
        })
        .await
        .map_err(|e| BrokerError::Connect(format!("metadata probe failed: {e}")))?
        .map_err(|e| BrokerError::Connect(e.to_string()))?;

        Ok(producer)
    }
}

#[async_trait]
impl PriceSink for KafkaSink {
    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, BrokerError> {
        let payload = serde_json::to_vec(envelope)?;
        let record = FutureRecord::<(), _>::to(&self.topic).payload(&payload);

        match self.producer.send(record, Timeout::After(ACK_TIMEOUT)).await {
            Ok((partition, offset)) => {
                let receipt = PublishReceipt {
                    topic: self.topic.clone(),
                    partition,
                    offset,
                };
                info!(
                    topic = %receipt.topic,
                    partition = receipt.partition,
                    offset = receipt.offset,
                    "published to Kafka"
                );
                Ok(receipt)
            }
            Err((KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut), _)) => {
                Err(BrokerError::AckTimeout(ACK_TIMEOUT))
            }
            Err((e, _)) => Err(BrokerError::Publish(e.to_string())),
        }
    }

    async fn flush_and_close(&self) -> Result<(), BrokerError> {
        debug!("flushing Kafka producer");
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(FLUSH_TIMEOUT)))
            .await
            .map_err(|e| BrokerError::Publish(format!("flush task failed: {e}")))?
            .map_err(|e| BrokerError::Publish(e.to_string()))
    }
}
