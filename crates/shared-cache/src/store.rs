//! Cache store port.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CacheError;

/// String-keyed store with per-key expiry and pattern enumeration.
///
/// Values are opaque serialized documents. Every operation is a single store
/// primitive; callers never build compare-and-swap sequences across calls.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a live value.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete the given keys. Returns how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Enumerate keys matching a glob `pattern`, `batch` keys per round trip.
    async fn scan_match(&self, pattern: &str, batch: usize) -> Result<Vec<String>, CacheError>;
}
