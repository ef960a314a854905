//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{DomainEvent, EventPayload};
use tracing::{debug, warn};

use crate::connection::BrokerConnection;
use crate::errors::BrokerError;

/// Trait for publishing events to the exchange.
///
/// Owning services call this after a successful mutation so other services
/// can update their projections.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event under its routing key.
    ///
    /// Returns once the message has been handed to the broker. Delivery to
    /// consumers is not confirmed.
    async fn publish(&self, event: &DomainEvent) -> Result<(), BrokerError>;

    /// Get the total number of events handed to the broker.
    fn events_published(&self) -> u64;
}

/// Publisher over the process's shared broker connection.
pub struct BrokerPublisher {
    connection: Arc<BrokerConnection>,
    events_published: AtomicU64,
}

impl BrokerPublisher {
    #[must_use]
    pub fn new(connection: Arc<BrokerConnection>) -> Self {
        Self {
            connection,
            events_published: AtomicU64::new(0),
        }
    }

    /// Encode a typed payload and publish it under its routing key.
    pub async fn publish_payload<T: EventPayload + Sync>(
        &self,
        payload: &T,
    ) -> Result<(), BrokerError> {
        let event = DomainEvent::from_payload(payload)?;
        self.publish(&event).await
    }
}

#[async_trait]
impl EventPublisher for BrokerPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), BrokerError> {
        let body = event.to_bytes()?;
        let channel = self.connection.channel().await?;

        match channel.publish(event.routing_key(), body).await {
            Ok(()) => {
                self.events_published.fetch_add(1, Ordering::Relaxed);
                debug!(
                    exchange = %self.connection.exchange().name,
                    routing_key = %event.routing_key(),
                    "Event published"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    routing_key = %event.routing_key(),
                    error = %e,
                    "Event publish failed"
                );
                Err(e)
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;
    use crate::memory::InMemoryTransport;
    use crate::topology::BindingKey;
    use chrono::Utc;
    use shared_types::{PostCreated, PostDeleted, POST_DELETED};
    use std::time::Duration;
    use tokio::time::timeout;

    fn publisher(transport: &InMemoryTransport) -> (Arc<BrokerConnection>, BrokerPublisher) {
        let connection = Arc::new(BrokerConnection::new(
            Arc::new(transport.clone()),
            BrokerConfig::default(),
        ));
        (Arc::clone(&connection), BrokerPublisher::new(connection))
    }

    fn deleted(post_id: &str) -> PostDeleted {
        PostDeleted {
            post_id: post_id.to_string(),
            user_id: "u1".to_string(),
            media_ids: vec!["m1".to_string()],
        }
    }

    #[tokio::test]
    async fn test_publish_no_bound_queues() {
        let transport = InMemoryTransport::new();
        let (_conn, publisher) = publisher(&transport);

        publisher.publish_payload(&deleted("p1")).await.unwrap();

        assert_eq!(publisher.events_published(), 1);
        assert_eq!(transport.messages_dropped("post_events"), 1);
    }

    #[tokio::test]
    async fn test_publish_reaches_bound_queue() {
        let transport = InMemoryTransport::new();
        let (conn, publisher) = publisher(&transport);

        let channel = conn.channel().await.unwrap();
        let mut queue = channel
            .bind_exclusive_queue(&BindingKey::new(POST_DELETED).unwrap())
            .await
            .unwrap();

        publisher.publish_payload(&deleted("p1")).await.unwrap();

        let delivery = timeout(Duration::from_millis(100), queue.next())
            .await
            .expect("timeout")
            .expect("stream open")
            .expect("delivery");
        assert_eq!(delivery.routing_key(), POST_DELETED);

        let event = DomainEvent::from_delivery(delivery.routing_key(), delivery.body()).unwrap();
        assert_eq!(event.decode::<PostDeleted>().unwrap(), deleted("p1"));
    }

    #[tokio::test]
    async fn test_binding_filters_other_routing_keys() {
        let transport = InMemoryTransport::new();
        let (conn, publisher) = publisher(&transport);

        let channel = conn.channel().await.unwrap();
        let mut queue = channel
            .bind_exclusive_queue(&BindingKey::new(POST_DELETED).unwrap())
            .await
            .unwrap();

        let created = PostCreated {
            post_id: "p1".to_string(),
            user_id: "u1".to_string(),
            content: "hello".to_string(),
            media_ids: Vec::new(),
            created_at: Utc::now(),
        };
        publisher.publish_payload(&created).await.unwrap();

        let result = timeout(Duration::from_millis(50), queue.next()).await;
        assert!(result.is_err(), "post.created must not reach a post.deleted queue");
    }

    #[tokio::test]
    async fn test_publish_fails_when_broker_unreachable() {
        let transport = InMemoryTransport::new();
        transport.set_online(false);
        let (_conn, publisher) = publisher(&transport);

        let result = publisher.publish_payload(&deleted("p1")).await;

        assert!(matches!(result, Err(BrokerError::Unavailable(_))));
        assert_eq!(publisher.events_published(), 0);
    }
}
