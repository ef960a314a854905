//! # Domain Events
//!
//! A `DomainEvent` is a routing key plus a JSON payload. Publishers build one
//! from a typed payload; consumers decode it back into the type they expect.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::EventError;

/// A concrete, dot-separated routing key such as `post.created`.
///
/// Publish keys never contain wildcards; binding patterns with `*` and `#`
/// are a broker concern and live in `shared-bus`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoutingKey(String);

impl RoutingKey {
    /// Maximum length accepted by AMQP for a short string.
    pub const MAX_LEN: usize = 255;

    /// Validate and wrap a routing key.
    pub fn new(key: impl Into<String>) -> Result<Self, EventError> {
        let key = key.into();
        let invalid = |reason| EventError::InvalidRoutingKey {
            key: key.clone(),
            reason,
        };

        if key.is_empty() {
            return Err(invalid("empty"));
        }
        if key.len() > Self::MAX_LEN {
            return Err(invalid("longer than 255 bytes"));
        }
        if key.split('.').count() < 2 {
            return Err(invalid("expected <entity>.<lifecycle-event>"));
        }
        if key.split('.').any(str::is_empty) {
            return Err(invalid("empty segment"));
        }
        if key.contains(['*', '#']) {
            return Err(invalid("wildcards are only valid in bindings"));
        }
        if key.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }

        Ok(Self(key))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entity segment (`post` in `post.created`).
    #[must_use]
    pub fn entity(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }

    /// Everything after the entity segment (`created` in `post.created`).
    #[must_use]
    pub fn lifecycle(&self) -> &str {
        self.0.split_once('.').map(|(_, rest)| rest).unwrap_or_default()
    }
}

impl TryFrom<String> for RoutingKey {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoutingKey> for String {
    fn from(key: RoutingKey) -> Self {
        key.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed payload bound to the routing key it is published under.
pub trait EventPayload: Serialize + DeserializeOwned {
    /// Routing key for this payload type.
    const ROUTING_KEY: &'static str;
}

/// An immutable event as it travels through the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    routing_key: RoutingKey,
    payload: serde_json::Value,
}

impl DomainEvent {
    /// Build an event from an already-validated key and raw JSON payload.
    #[must_use]
    pub fn new(routing_key: RoutingKey, payload: serde_json::Value) -> Self {
        Self {
            routing_key,
            payload,
        }
    }

    /// Build an event from a typed payload, using the payload's routing key.
    pub fn from_payload<T: EventPayload>(payload: &T) -> Result<Self, EventError> {
        let routing_key = RoutingKey::new(T::ROUTING_KEY)?;
        let payload =
            serde_json::to_value(payload).map_err(|e| EventError::Serialization(e.to_string()))?;
        Ok(Self::new(routing_key, payload))
    }

    /// Rebuild an event from a broker delivery.
    pub fn from_delivery(routing_key: &str, body: &[u8]) -> Result<Self, EventError> {
        let routing_key = RoutingKey::new(routing_key)?;
        let payload =
            serde_json::from_slice(body).map_err(|e| EventError::MalformedPayload {
                routing_key: routing_key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(routing_key, payload))
    }

    /// The routing key this event is published under.
    #[must_use]
    pub fn routing_key(&self) -> &RoutingKey {
        &self.routing_key
    }

    /// The raw JSON payload.
    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Serialize the payload into the message body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(&self.payload).map_err(|e| EventError::Serialization(e.to_string()))
    }

    /// Decode the payload into a typed structure.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EventError> {
        T::deserialize(&self.payload).map_err(|e| EventError::MalformedPayload {
            routing_key: self.routing_key.to_string(),
            reason: e.to_string(),
        })
    }
}
