//! Publish bridge handlers
//!
//! Turn dispatched events into broker messages.

use std::sync::Arc;

use async_trait::async_trait;

use super::dispatcher::{DispatcherError, EventDispatcher, EventHandler};
use super::publisher::MessagePublisher;
use crate::domain::{Event, EventName};

/// Topic for each event name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRoutes {
    pub transaction_created: String,
    pub balance_updated: String,
}

impl TopicRoutes {
    pub fn topic_for(&self, name: EventName) -> &str {
        match name {
            EventName::TransactionCreated => &self.transaction_created,
            EventName::BalanceUpdated => &self.balance_updated,
        }
    }
}

impl Default for TopicRoutes {
    fn default() -> Self {
        Self {
            transaction_created: "transactions".to_string(),
            balance_updated: "balances".to_string(),
        }
    }
}

/// Publishes every event it receives to one topic
pub struct PublishHandler {
    label: String,
    topic: String,
    publisher: Arc<dyn MessagePublisher>,
}

impl PublishHandler {
    pub fn new(topic: impl Into<String>, publisher: Arc<dyn MessagePublisher>) -> Self {
        let topic = topic.into();
        Self {
            label: format!("publish:{}", topic),
            topic,
            publisher,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl EventHandler for PublishHandler {
    fn name(&self) -> &str {
        &self.label
    }

    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(event)?;
        let key = event.routing_key().to_string();

        self.publisher.publish(&self.topic, &key, &payload).await?;

        tracing::debug!(
            event = %event.name(),
            topic = %self.topic,
            key = %key,
            "Event published"
        );
        Ok(())
    }
}

/// Register one `PublishHandler` per event name, routed by `routes`
pub fn register_publishers(
    dispatcher: &EventDispatcher,
    routes: &TopicRoutes,
    publisher: Arc<dyn MessagePublisher>,
) -> Result<(), DispatcherError> {
    for name in EventName::ALL {
        let handler = PublishHandler::new(routes.topic_for(name), Arc::clone(&publisher));
        dispatcher.register(name, Arc::new(handler))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BalanceUpdated, TransactionCreated};
    use crate::events::publisher::PublishError;
    use rust_decimal_macros::dec;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(String, String, serde_json::Value)>>,
    }

    #[async_trait]
    impl MessagePublisher for Recording {
        async fn publish(
            &self,
            topic: &str,
            key: &str,
            payload: &[u8],
        ) -> Result<(), PublishError> {
            let value = serde_json::from_slice(payload).map_err(|e| PublishError::Delivery {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
            self.sent
                .lock()
                .await
                .push((topic.to_string(), key.to_string(), value));
            Ok(())
        }
    }

    struct Down;

    #[async_trait]
    impl MessagePublisher for Down {
        async fn publish(&self, topic: &str, _: &str, _: &[u8]) -> Result<(), PublishError> {
            Err(PublishError::Delivery {
                topic: topic.to_string(),
                reason: "broker down".to_string(),
            })
        }
    }

    #[test]
    fn test_default_routes() {
        let routes = TopicRoutes::default();
        assert_eq!(routes.topic_for(EventName::TransactionCreated), "transactions");
        assert_eq!(routes.topic_for(EventName::BalanceUpdated), "balances");
    }

    #[tokio::test]
    async fn test_events_routed_to_their_topics() {
        let recording = Arc::new(Recording::default());
        let dispatcher = EventDispatcher::new();
        register_publishers(&dispatcher, &TopicRoutes::default(), recording.clone()).unwrap();

        let transaction_id = Uuid::new_v4();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();

        dispatcher
            .dispatch(Event::transaction_created(TransactionCreated {
                id: transaction_id,
                account_id_from: from,
                account_id_to: to,
                amount: dec!(100),
            }))
            .await;
        dispatcher
            .dispatch(Event::balance_updated(BalanceUpdated {
                account_id_from: from,
                account_id_to: to,
                balance_account_id_from: dec!(900),
                balance_account_id_to: dec!(1100),
            }))
            .await;

        let sent = recording.sent.lock().await;
        assert_eq!(sent.len(), 2);

        let (topic, key, body) = &sent[0];
        assert_eq!(topic, "transactions");
        assert_eq!(key, &transaction_id.to_string());
        assert_eq!(body["name"], "TransactionCreated");
        assert_eq!(body["payload"]["id"], transaction_id.to_string());

        let (topic, key, body) = &sent[1];
        assert_eq!(topic, "balances");
        assert_eq!(key, &from.to_string());
        assert_eq!(body["name"], "BalanceUpdated");
    }

    #[tokio::test]
    async fn test_publish_failure_reported_by_dispatch() {
        let dispatcher = EventDispatcher::new();
        register_publishers(&dispatcher, &TopicRoutes::default(), Arc::new(Down)).unwrap();

        let report = dispatcher
            .dispatch(Event::transaction_created(TransactionCreated {
                id: Uuid::new_v4(),
                account_id_from: Uuid::new_v4(),
                account_id_to: Uuid::new_v4(),
                amount: dec!(1),
            }))
            .await;

        assert_eq!(report.handled, 0);
        assert_eq!(report.failed, 1);
    }
}
