//! # Broker Errors

use shared_types::EventError;
use thiserror::Error;

/// Errors from broker lifecycle, publish and subscribe operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The transport could not be established (connect or channel creation).
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// The connection was closed explicitly.
    #[error("Broker connection closed")]
    Closed,

    /// A channel-level operation failed after the connection was up.
    #[error("Channel error: {0}")]
    Channel(String),

    /// The exchange already exists with incompatible settings.
    #[error("Exchange '{name}' redeclared with different settings")]
    ExchangeMismatch { name: String },

    /// A binding pattern is malformed.
    #[error("Invalid binding key '{key}': {reason}")]
    InvalidBindingKey { key: String, reason: &'static str },

    /// The event could not be encoded.
    #[error(transparent)]
    Event(#[from] EventError),
}

impl BrokerError {
    /// Whether the error means the broker itself is unreachable.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Closed)
    }
}
