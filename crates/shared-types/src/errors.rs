//! # Error Types
//!
//! Errors raised while building, encoding or decoding domain events.

use thiserror::Error;

/// Errors that can occur when handling domain events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The routing key does not have the `<entity>.<lifecycle-event>` shape.
    #[error("Invalid routing key '{key}': {reason}")]
    InvalidRoutingKey { key: String, reason: &'static str },

    /// The payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The payload bytes or JSON do not match the expected event shape.
    #[error("Malformed payload for '{routing_key}': {reason}")]
    MalformedPayload { routing_key: String, reason: String },
}
