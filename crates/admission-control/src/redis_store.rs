//! Redis-backed counter store shared by every service instance.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tracing::info;

use crate::store::{AdmissionError, CounterStore, WindowState};

fn unavailable(e: RedisError) -> AdmissionError {
    AdmissionError::StoreUnavailable(e.to_string())
}

/// [`CounterStore`] over a shared Redis instance.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    /// Open a managed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, AdmissionError> {
        let client = Client::open(redis_url).map_err(unavailable)?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(unavailable)?;
        info!("Connected to admission counter store");
        Ok(Self { connection })
    }

    /// Wrap an existing connection manager.
    #[must_use]
    pub fn from_connection(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn consume(&self, key: &str, window: Duration) -> Result<WindowState, AdmissionError> {
        let mut conn = self.connection.clone();
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1);

        // One MULTI/EXEC: open the window if absent, count, read the deadline.
        let (consumed, pttl): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("PX")
            .arg(window_ms)
            .arg("NX")
            .ignore()
            .cmd("INCR")
            .arg(key)
            .cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        // PTTL is negative only if the key lost its expiry; treat it as a fresh window.
        let resets_in = u64::try_from(pttl)
            .map(Duration::from_millis)
            .unwrap_or(window);

        Ok(WindowState {
            consumed,
            resets_in,
        })
    }
}
