//! # Event Consumer
//!
//! Defines the subscription side of the event bus.
//!
//! Each subscription owns one exclusive queue and one task. The task handles
//! deliveries strictly one at a time:
//!
//! | Handler outcome              | Settlement               |
//! |------------------------------|--------------------------|
//! | `Ok(())`                     | ack                      |
//! | retryable error              | delay, nack + requeue    |
//! | malformed payload            | nack, no requeue         |
//!
//! A message is therefore acknowledged only once its side effects are in
//! place, and a poison message cannot loop forever.
//!
//! There is no consumer-side reconnect. If the broker ends a delivery stream
//! the subscription stops, logs an error and withdraws the readiness gate
//! given to [`EventConsumer::with_readiness`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared_types::{DomainEvent, EventError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::connection::BrokerConnection;
use crate::errors::BrokerError;
use crate::readiness::ReadinessGate;
use crate::topology::BindingKey;
use crate::transport::{Delivery, DeliveryStream};

/// Errors a handler reports back to the consumer loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The payload can never be processed. The message is discarded.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The projection store failed. The message is redelivered.
    #[error("Store error: {0}")]
    Store(String),

    /// A downstream dependency failed. The message is redelivered.
    #[error("Downstream error: {0}")]
    Downstream(String),
}

impl HandlerError {
    /// Whether redelivering the message could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MalformedPayload(_))
    }
}

impl From<EventError> for HandlerError {
    fn from(e: EventError) -> Self {
        Self::MalformedPayload(e.to_string())
    }
}

/// Processes events delivered to one subscription.
///
/// Handlers must be idempotent: the same event may arrive more than once.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;
}

/// Delivery counters for one subscription.
#[derive(Debug, Default)]
pub struct SubscriptionStats {
    delivered: AtomicU64,
    acked: AtomicU64,
    requeued: AtomicU64,
    discarded: AtomicU64,
}

/// Point-in-time copy of [`SubscriptionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub delivered: u64,
    pub acked: u64,
    pub requeued: u64,
    pub discarded: u64,
}

impl SubscriptionStats {
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            acked: self.acked.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Binds handlers to exclusive queues on the shared connection.
pub struct EventConsumer {
    connection: Arc<BrokerConnection>,
    readiness: Option<ReadinessGate>,
}

impl EventConsumer {
    #[must_use]
    pub fn new(connection: Arc<BrokerConnection>) -> Self {
        Self {
            connection,
            readiness: None,
        }
    }

    /// Withdraw `readiness` whenever one of this consumer's subscriptions
    /// loses its delivery stream.
    #[must_use]
    pub fn with_readiness(mut self, readiness: ReadinessGate) -> Self {
        self.readiness = Some(readiness);
        self
    }

    /// Bind a fresh exclusive queue under `binding` and start handling its
    /// deliveries.
    ///
    /// The binding is in place when this returns, so events published
    /// afterwards reach the handler.
    pub async fn subscribe(
        &self,
        binding: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<Subscription, BrokerError> {
        let binding = BindingKey::new(binding)?;
        let channel = self.connection.channel().await?;
        let stream = channel.bind_exclusive_queue(&binding).await?;

        let queue_name = stream.queue_name().to_string();
        let stats = Arc::new(SubscriptionStats::default());
        let worker = ConsumeLoop {
            binding: binding.clone(),
            handler,
            stats: Arc::clone(&stats),
            redelivery_delay: self.connection.config().redelivery_delay(),
            readiness: self.readiness.clone(),
        };
        let task = tokio::spawn(worker.run(stream));

        info!(binding = %binding, queue = %queue_name, "Subscribed");

        Ok(Subscription {
            binding,
            queue_name,
            stats,
            task,
        })
    }
}

struct ConsumeLoop {
    binding: BindingKey,
    handler: Arc<dyn EventHandler>,
    stats: Arc<SubscriptionStats>,
    redelivery_delay: Duration,
    readiness: Option<ReadinessGate>,
}

impl ConsumeLoop {
    async fn run(self, mut stream: Box<dyn DeliveryStream>) {
        while let Some(next) = stream.next().await {
            match next {
                Ok(delivery) => self.process(delivery).await,
                Err(e) => {
                    error!(binding = %self.binding, error = %e, "Delivery stream failed");
                    break;
                }
            }
        }
        // Only reached when the broker side ended the stream; dropping the
        // subscription aborts the task before this point.
        error!(
            binding = %self.binding,
            queue = %stream.queue_name(),
            "Consumer stopped, events for this binding are no longer received"
        );
        if let Some(readiness) = &self.readiness {
            readiness.mark_unready("delivery stream ended");
        }
    }

    async fn process(&self, delivery: Delivery) {
        self.stats.delivered.fetch_add(1, Ordering::Relaxed);

        let outcome = match DomainEvent::from_delivery(delivery.routing_key(), delivery.body()) {
            Ok(event) => self.handler.handle(&event).await,
            Err(e) => Err(HandlerError::from(e)),
        };

        let routing_key = delivery.routing_key().to_string();
        let settled = match outcome {
            Ok(()) => {
                self.stats.acked.fetch_add(1, Ordering::Relaxed);
                delivery.ack().await
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    routing_key = %routing_key,
                    redelivered = delivery.redelivered(),
                    error = %e,
                    "Handler failed, requeueing"
                );
                tokio::time::sleep(self.redelivery_delay).await;
                self.stats.requeued.fetch_add(1, Ordering::Relaxed);
                delivery.nack(true).await
            }
            Err(e) => {
                error!(routing_key = %routing_key, error = %e, "Discarding poison message");
                self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                delivery.nack(false).await
            }
        };

        if let Err(e) = settled {
            warn!(routing_key = %routing_key, error = %e, "Failed to settle delivery");
        }
    }
}

/// A live subscription.
///
/// When dropped, the consumer task stops and its exclusive queue is deleted.
pub struct Subscription {
    binding: BindingKey,
    queue_name: String,
    stats: Arc<SubscriptionStats>,
    task: JoinHandle<()>,
}

impl Subscription {
    #[must_use]
    pub fn binding(&self) -> &BindingKey {
        &self.binding
    }

    /// Name the broker gave the exclusive queue.
    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether the consumer task is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        debug!(binding = %self.binding, queue = %self.queue_name, "Subscription dropped");
    }
}
