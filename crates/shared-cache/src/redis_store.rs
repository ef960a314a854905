//! Redis-backed cache store.
//!
//! One multiplexed `ConnectionManager` per process; it reconnects on its own
//! after a dropped connection. Clones are cheap handles to the same
//! connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tracing::{debug, info};

use crate::errors::CacheError;
use crate::store::CacheStore;

fn unavailable(e: RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

/// [`CacheStore`] over a shared Redis instance.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    /// Open a managed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url).map_err(unavailable)?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(unavailable)?;
        info!("Connected to cache store");
        Ok(Self { connection })
    }

    /// Wrap an existing connection manager.
    #[must_use]
    pub fn from_connection(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(unavailable)?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection.clone();
        let removed: u64 = conn.del(keys).await.map_err(unavailable)?;
        Ok(removed)
    }

    async fn scan_match(&self, pattern: &str, batch: usize) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        // SCAN, never KEYS: each round trip touches at most `batch` slots.
        loop {
            let (next, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(batch)
                .query_async(&mut conn)
                .await
                .map_err(unavailable)?;
            keys.extend(page);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once.
        keys.sort_unstable();
        keys.dedup();
        debug!(pattern, matched = keys.len(), "Scanned cache keys");
        Ok(keys)
    }
}
