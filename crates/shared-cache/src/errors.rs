//! # Cache Errors

use thiserror::Error;

/// Errors from cache store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache store could not be reached or rejected the command.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    /// A value could not be serialized into, or read back from, the cache.
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
