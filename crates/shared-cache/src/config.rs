//! Cache configuration with validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cache-aside TTLs and sweep tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL of single-entity snapshots, in seconds.
    pub entity_ttl_secs: u64,
    /// TTL of collection pages, in seconds.
    pub collection_ttl_secs: u64,
    /// `COUNT` hint passed to each `SCAN` during a sweep.
    pub scan_batch: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entity_ttl_secs: 3600,
            collection_ttl_secs: 300,
            scan_batch: 100,
        }
    }
}

impl CacheConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        if self.entity_ttl_secs == 0 {
            return Err(CacheConfigError::InvalidTtl(
                "entity_ttl_secs cannot be 0".into(),
            ));
        }
        if self.collection_ttl_secs == 0 {
            return Err(CacheConfigError::InvalidTtl(
                "collection_ttl_secs cannot be 0".into(),
            ));
        }
        if self.scan_batch == 0 {
            return Err(CacheConfigError::Invalid("scan_batch cannot be 0".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn entity_ttl(&self) -> Duration {
        Duration::from_secs(self.entity_ttl_secs)
    }

    #[must_use]
    pub fn collection_ttl(&self) -> Duration {
        Duration::from_secs(self.collection_ttl_secs)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheConfigError {
    #[error("invalid ttl: {0}")]
    InvalidTtl(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
