//! # Shared Types Crate
//!
//! Domain events and routing keys exchanged between the services over the
//! shared topic exchange.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every event that crosses a service boundary is
//!   defined here, together with the routing key it travels under.
//! - **Payload-Only Wire Format**: the message body is the JSON payload; the
//!   routing key is carried by the broker, not repeated in the body.
//! - **Immutable Events**: a `DomainEvent` has no setters. Once built it is
//!   published as-is.

pub mod errors;
pub mod events;
pub mod payloads;

pub use errors::EventError;
pub use events::{DomainEvent, EventPayload, RoutingKey};
pub use payloads::{MediaId, PostCreated, PostDeleted, PostId, UserId};

/// Routing key published after a post is persisted.
pub const POST_CREATED: &str = "post.created";

/// Routing key published after a post is removed.
pub const POST_DELETED: &str = "post.deleted";
