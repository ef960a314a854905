//! In-process counter store.
//!
//! Only correct for a single instance; horizontally scaled deployments use
//! the Redis store. Time follows `tokio::time` so tests can advance it.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::store::{AdmissionError, CounterStore, WindowState};

struct Window {
    consumed: u64,
    resets_at: Instant,
}

/// DashMap-backed [`CounterStore`].
#[derive(Default)]
pub struct InMemoryCounterStore {
    windows: DashMap<String, Window>,
}

impl InMemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop windows that have already reset (call periodically).
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.windows.retain(|key, window| {
            let live = now < window.resets_at;
            if !live {
                debug!(key = %key, "Removing expired admission window");
            }
            live
        });
    }

    /// Number of tracked counters.
    #[must_use]
    pub fn counter_count(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn consume(&self, key: &str, window: Duration) -> Result<WindowState, AdmissionError> {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            consumed: 0,
            resets_at: now + window,
        });

        if now >= entry.resets_at {
            entry.consumed = 0;
            entry.resets_at = now + window;
        }
        entry.consumed += 1;

        Ok(WindowState {
            consumed: entry.consumed,
            resets_in: entry.resets_at - now,
        })
    }
}

/// Background task to drop expired windows.
pub async fn cleanup_task(store: std::sync::Arc<InMemoryCounterStore>, interval: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        store.cleanup();
    }
}
