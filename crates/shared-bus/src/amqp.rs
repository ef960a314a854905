//! # AMQP Transport
//!
//! RabbitMQ-backed implementation of the transport ports via `lapin`.
//!
//! - One connection and one channel per `open`
//! - Topic exchange declared with the requested durability
//! - Server-named exclusive queues, manual acknowledgement

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Connection, ConnectionProperties, Consumer, ExchangeKind};
use shared_types::RoutingKey;
use tracing::{debug, info};

use crate::errors::BrokerError;
use crate::topology::{BindingKey, ExchangeSpec};
use crate::transport::{Acknowledger, Channel, Delivery, DeliveryStream, Transport};

/// Transport connecting to an AMQP 0-9-1 broker.
pub struct AmqpTransport {
    url: String,
}

impl AmqpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

fn unavailable(e: lapin::Error) -> BrokerError {
    BrokerError::Unavailable(e.to_string())
}

fn channel_error(e: lapin::Error) -> BrokerError {
    BrokerError::Channel(e.to_string())
}

#[async_trait]
impl Transport for AmqpTransport {
    async fn open(&self, exchange: &ExchangeSpec) -> Result<Arc<dyn Channel>, BrokerError> {
        let connection = Connection::connect(&self.url, ConnectionProperties::default())
            .await
            .map_err(unavailable)?;
        let channel = connection.create_channel().await.map_err(unavailable)?;

        channel
            .exchange_declare(
                &exchange.name,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: exchange.durable,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(unavailable)?;

        info!(exchange = %exchange.name, "AMQP channel open, exchange declared");

        Ok(Arc::new(AmqpChannel {
            connection,
            channel,
            exchange: exchange.name.clone(),
            open: AtomicBool::new(true),
        }))
    }
}

struct AmqpChannel {
    connection: Connection,
    channel: lapin::Channel,
    exchange: String,
    open: AtomicBool,
}

#[async_trait]
impl Channel for AmqpChannel {
    async fn publish(&self, routing_key: &RoutingKey, body: Vec<u8>) -> Result<(), BrokerError> {
        // The returned confirm is not awaited: publishing is fire-and-forget.
        self.channel
            .basic_publish(
                &self.exchange,
                routing_key.as_str(),
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default(),
            )
            .await
            .map_err(channel_error)?;
        Ok(())
    }

    async fn bind_exclusive_queue(
        &self,
        binding: &BindingKey,
    ) -> Result<Box<dyn DeliveryStream>, BrokerError> {
        let queue = self
            .channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(channel_error)?;
        let queue_name = queue.name().as_str().to_string();

        self.channel
            .queue_bind(
                &queue_name,
                &self.exchange,
                binding.as_str(),
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(channel_error)?;

        let consumer = self
            .channel
            .basic_consume(
                &queue_name,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(channel_error)?;

        debug!(queue = %queue_name, binding = %binding, "Exclusive queue bound");

        Ok(Box::new(AmqpDeliveryStream {
            queue_name,
            consumer,
        }))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        if self.open.swap(false, Ordering::SeqCst) {
            self.connection
                .close(200, "closing")
                .await
                .map_err(channel_error)?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && self.channel.status().connected()
    }
}

struct AmqpDeliveryStream {
    queue_name: String,
    consumer: Consumer,
}

#[async_trait]
impl DeliveryStream for AmqpDeliveryStream {
    fn queue_name(&self) -> &str {
        &self.queue_name
    }

    async fn next(&mut self) -> Option<Result<Delivery, BrokerError>> {
        let mut delivery = match self.consumer.next().await? {
            Ok(delivery) => delivery,
            Err(e) => return Some(Err(channel_error(e))),
        };

        let body = std::mem::take(&mut delivery.data);
        let routing_key = delivery.routing_key.as_str().to_string();
        let redelivered = delivery.redelivered;

        Some(Ok(Delivery::new(
            routing_key,
            body,
            redelivered,
            Box::new(AmqpAcker { delivery }),
        )))
    }
}

struct AmqpAcker {
    delivery: lapin::message::Delivery,
}

#[async_trait]
impl Acknowledger for AmqpAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.delivery
            .acker
            .ack(BasicAckOptions::default())
            .await
            .map(|_| ())
            .map_err(channel_error)
    }

    async fn nack(&self, requeue: bool) -> Result<(), BrokerError> {
        self.delivery
            .acker
            .nack(BasicNackOptions {
                requeue,
                ..BasicNackOptions::default()
            })
            .await
            .map(|_| ())
            .map_err(channel_error)
    }
}
