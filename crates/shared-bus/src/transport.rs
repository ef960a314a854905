//! # Transport Ports
//!
//! The broker is reached through these traits so the connection manager,
//! publisher and consumer never depend on a concrete client library.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::RoutingKey;

use crate::errors::BrokerError;
use crate::topology::{BindingKey, ExchangeSpec};

/// Establishes a connection and declares the exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect, open a channel and declare `exchange` on it.
    ///
    /// Fails with [`BrokerError::Unavailable`] when the transport cannot be
    /// established.
    async fn open(&self, exchange: &ExchangeSpec) -> Result<Arc<dyn Channel>, BrokerError>;
}

/// An open channel bound to one exchange.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Route `body` through the exchange under `routing_key`.
    ///
    /// No delivery confirmation is awaited.
    async fn publish(&self, routing_key: &RoutingKey, body: Vec<u8>) -> Result<(), BrokerError>;

    /// Declare an exclusive, server-named queue, bind it under `binding` and
    /// start consuming from it.
    ///
    /// The binding is in place when this returns.
    async fn bind_exclusive_queue(
        &self,
        binding: &BindingKey,
    ) -> Result<Box<dyn DeliveryStream>, BrokerError>;

    /// Close the channel and its connection. Exclusive queues go with it.
    async fn close(&self) -> Result<(), BrokerError>;

    /// Whether the channel can still be used.
    fn is_open(&self) -> bool;
}

/// Deliveries from one exclusive queue.
#[async_trait]
pub trait DeliveryStream: Send {
    /// Name the broker assigned to the queue.
    fn queue_name(&self) -> &str;

    /// Wait for the next delivery. `None` once the queue is gone.
    async fn next(&mut self) -> Option<Result<Delivery, BrokerError>>;
}

/// Settles a single delivery with the broker.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Positive acknowledgement; the broker forgets the message.
    async fn ack(&self) -> Result<(), BrokerError>;

    /// Negative acknowledgement; with `requeue` the broker delivers it again.
    async fn nack(&self, requeue: bool) -> Result<(), BrokerError>;
}

/// A message received from a queue, not yet settled.
pub struct Delivery {
    routing_key: String,
    body: Vec<u8>,
    redelivered: bool,
    acker: Box<dyn Acknowledger>,
}

impl Delivery {
    pub fn new(
        routing_key: impl Into<String>,
        body: Vec<u8>,
        redelivered: bool,
        acker: Box<dyn Acknowledger>,
    ) -> Self {
        Self {
            routing_key: routing_key.into(),
            body,
            redelivered,
            acker,
        }
    }

    #[must_use]
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the broker has delivered this message before.
    #[must_use]
    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    pub async fn ack(self) -> Result<(), BrokerError> {
        self.acker.ack().await
    }

    pub async fn nack(self, requeue: bool) -> Result<(), BrokerError> {
        self.acker.nack(requeue).await
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("routing_key", &self.routing_key)
            .field("body_len", &self.body.len())
            .field("redelivered", &self.redelivered)
            .finish()
    }
}
