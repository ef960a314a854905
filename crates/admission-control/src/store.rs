//! Counter store port.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from admission control.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The shared counter store could not be reached.
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Counter state right after one consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Points consumed in the current window, including this one.
    pub consumed: u64,
    /// Time until the window resets.
    pub resets_in: Duration,
}

/// Shared atomic counter store.
///
/// `consume` must be a single atomic step in the store: start a window of
/// length `window` if none is running, then count one consumption in it.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn consume(&self, key: &str, window: Duration) -> Result<WindowState, AdmissionError>;
}
