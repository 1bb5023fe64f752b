//! Message publishers
//!
//! Outbound side of the publish bridge. `LogPublisher` is used when no
//! broker is configured; `KafkaPublisher` requires the `kafka` feature.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to create producer: {0}")]
    Producer(String),

    #[error("Failed to deliver message to {topic}: {reason}")]
    Delivery { topic: String, reason: String },
}

/// Sends keyed payloads to a named topic
#[async_trait]
pub trait MessagePublisher: Send + Sync + 'static {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Writes one structured log line per message
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

#[async_trait]
impl MessagePublisher for LogPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        tracing::info!(
            topic = %topic,
            key = %key,
            payload = %String::from_utf8_lossy(payload),
            "Message published"
        );
        Ok(())
    }
}

#[cfg(feature = "kafka")]
pub use kafka::KafkaPublisher;

#[cfg(feature = "kafka")]
mod kafka {
    use std::time::Duration;

    use async_trait::async_trait;
    use rdkafka::config::ClientConfig;
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use rdkafka::util::Timeout;

    use super::{MessagePublisher, PublishError};

    pub struct KafkaPublisher {
        producer: FutureProducer,
        timeout: Duration,
    }

    impl KafkaPublisher {
        pub fn new(brokers: &str, message_timeout: Duration) -> Result<Self, PublishError> {
            let producer: FutureProducer = ClientConfig::new()
                .set("bootstrap.servers", brokers)
                .set("message.timeout.ms", message_timeout.as_millis().to_string())
                .create()
                .map_err(|e| PublishError::Producer(e.to_string()))?;

            Ok(Self {
                producer,
                timeout: message_timeout,
            })
        }
    }

    #[async_trait]
    impl MessagePublisher for KafkaPublisher {
        async fn publish(
            &self,
            topic: &str,
            key: &str,
            payload: &[u8],
        ) -> Result<(), PublishError> {
            let record = FutureRecord::to(topic).key(key).payload(payload);

            self.producer
                .send(record, Timeout::After(self.timeout))
                .await
                .map_err(|(e, _)| PublishError::Delivery {
                    topic: topic.to_string(),
                    reason: e.to_string(),
                })?;

            tracing::debug!(topic = %topic, key = %key, "Published to Kafka");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_publisher_accepts_any_payload() {
        let publisher = LogPublisher;
        publisher
            .publish("transactions", "key", b"{\"ok\":true}")
            .await
            .unwrap();
        publisher.publish("balances", "key", &[0xff, 0xfe]).await.unwrap();
    }
}
