//! # Exchange and Binding Topology
//!
//! Topic-exchange routing rules: a binding key is a dot-separated pattern in
//! which `*` matches exactly one word and `#` matches zero or more words.

use std::fmt;

use crate::errors::BrokerError;

/// Declaration parameters for the shared topic exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSpec {
    /// Exchange name.
    pub name: String,
    /// Whether the exchange survives a broker restart.
    pub durable: bool,
}

impl ExchangeSpec {
    /// A non-durable topic exchange.
    ///
    /// Messages are not expected to survive a broker restart: handlers are
    /// idempotent and derived stores can be rebuilt from the source of truth.
    #[must_use]
    pub fn topic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: false,
        }
    }
}

/// A validated binding pattern such as `post.created`, `post.*` or `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey(String);

impl BindingKey {
    /// Validate and wrap a binding pattern.
    pub fn new(key: impl Into<String>) -> Result<Self, BrokerError> {
        let key = key.into();
        let invalid = |reason| BrokerError::InvalidBindingKey {
            key: key.clone(),
            reason,
        };

        if key.is_empty() {
            return Err(invalid("empty"));
        }
        for segment in key.split('.') {
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            if segment.len() > 1 && segment.contains(['*', '#']) {
                return Err(invalid("wildcards must be whole segments"));
            }
        }

        Ok(Self(key))
    }

    /// The pattern as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a message with `routing_key` is routed to a queue bound with this pattern.
    #[must_use]
    pub fn matches(&self, routing_key: &str) -> bool {
        let pattern: Vec<&str> = self.0.split('.').collect();
        let key: Vec<&str> = routing_key.split('.').collect();
        matches_segments(&pattern, &key)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn matches_segments(pattern: &[&str], key: &[&str]) -> bool {
    match (pattern.split_first(), key.split_first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some((&"#", rest)), _) => {
            matches_segments(rest, key) || (!key.is_empty() && matches_segments(pattern, &key[1..]))
        }
        (Some(_), None) => false,
        (Some((&"*", rest)), Some((_, key_rest))) => matches_segments(rest, key_rest),
        (Some((word, rest)), Some((segment, key_rest))) => {
            word == segment && matches_segments(rest, key_rest)
        }
    }
}
