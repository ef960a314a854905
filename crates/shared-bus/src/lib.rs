//! # Shared Bus - Topic Exchange for Inter-Service Events
//!
//! Services never share a database. An owning service publishes a domain
//! event after a successful mutation; every other service that cares binds
//! its own exclusive queue and projects the event into a derived store.
//!
//! ## Topology
//!
//! ```text
//! ┌──────────────┐                         ┌────────────────┐
//! │ post-service │  publish(post.deleted)  │ search-service │
//! │              │ ──────┐         ┌─────▶ │  [excl. queue] │
//! └──────────────┘       │         │       └────────────────┘
//!                        ▼         │
//!                 ┌──────────────────┐     ┌────────────────┐
//!                 │  topic exchange  │ ──▶ │ media-service  │
//!                 │  (non-durable)   │     │  [excl. queue] │
//!                 └──────────────────┘     └────────────────┘
//! ```
//!
//! ## Delivery Contract
//!
//! - **At-least-once:** a message is acknowledged only after its handler
//!   returns `Ok`. Failed handlers cause a redelivery, so handlers must be
//!   idempotent.
//! - **Per-binding FIFO:** one task per subscription processes deliveries
//!   strictly in order. Nothing is ordered across bindings.
//! - **No queue, no route:** a message published before any queue is bound to
//!   its routing key is dropped. Consumers must subscribe before dependent
//!   publishers take traffic; [`ReadinessGate`] enforces this inside a process.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

#[cfg(feature = "amqp")]
pub mod amqp;
pub mod config;
pub mod connection;
pub mod errors;
pub mod memory;
pub mod publisher;
pub mod readiness;
pub mod subscriber;
pub mod topology;
pub mod transport;

// Re-export main types
#[cfg(feature = "amqp")]
pub use amqp::AmqpTransport;
pub use config::BrokerConfig;
pub use connection::BrokerConnection;
pub use errors::BrokerError;
pub use memory::InMemoryTransport;
pub use publisher::{BrokerPublisher, EventPublisher};
pub use readiness::ReadinessGate;
pub use subscriber::{
    EventConsumer, EventHandler, HandlerError, StatsSnapshot, Subscription, SubscriptionStats,
};
pub use topology::{BindingKey, ExchangeSpec};
pub use transport::{Acknowledger, Channel, Delivery, DeliveryStream, Transport};

/// Exchange every service publishes to and binds against.
pub const DEFAULT_EXCHANGE: &str = "post_events";
