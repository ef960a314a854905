//! # Broker Connection Manager
//!
//! Owns the single channel a process uses for every publish and subscribe.
//!
//! ## Lifecycle
//!
//! ```text
//!   new() ──open()/open_with_retry()──▶ OPEN ──close()──▶ CLOSED
//!     │                                  ▲
//!     └──────── channel() (lazy) ────────┘
//! ```
//!
//! `channel()` on a manager that was never opened performs one connect
//! attempt. If it fails, the error goes back to the caller and the operation
//! is abandoned; there is no background reconnect loop. Only
//! `open_with_retry()`, used at boot, backs off and tries again.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::errors::BrokerError;
use crate::topology::ExchangeSpec;
use crate::transport::{Channel, Transport};

/// Per-process owner of the broker connection.
pub struct BrokerConnection {
    transport: Arc<dyn Transport>,
    config: BrokerConfig,
    exchange: ExchangeSpec,
    channel: Mutex<Option<Arc<dyn Channel>>>,
}

impl BrokerConnection {
    /// Create a manager. Nothing is connected until `open` or `channel`.
    pub fn new(transport: Arc<dyn Transport>, config: BrokerConfig) -> Self {
        let exchange = ExchangeSpec::topic(config.exchange.clone());
        Self {
            transport,
            config,
            exchange,
            channel: Mutex::new(None),
        }
    }

    /// Connect and declare the exchange, or return the channel already open.
    pub async fn open(&self) -> Result<Arc<dyn Channel>, BrokerError> {
        let mut slot = self.channel.lock().await;
        if let Some(channel) = slot.as_ref().filter(|c| c.is_open()) {
            return Ok(Arc::clone(channel));
        }

        match self.transport.open(&self.exchange).await {
            Ok(channel) => {
                info!(exchange = %self.exchange.name, "Connected to broker");
                *slot = Some(Arc::clone(&channel));
                Ok(channel)
            }
            Err(e) => {
                warn!(exchange = %self.exchange.name, error = %e, "Error connecting to broker");
                Err(e)
            }
        }
    }

    /// Boot-time connect with exponential backoff, bounded by `connect_attempts`.
    pub async fn open_with_retry(&self) -> Result<Arc<dyn Channel>, BrokerError> {
        let attempts = self.config.connect_attempts.max(1);
        let mut attempt = 0;
        loop {
            match self.open().await {
                Ok(channel) => return Ok(channel),
                Err(e) if e.is_unavailable() && attempt + 1 < attempts => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        "Broker unavailable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// The shared channel, connecting once if nothing is open yet.
    pub async fn channel(&self) -> Result<Arc<dyn Channel>, BrokerError> {
        {
            let slot = self.channel.lock().await;
            if let Some(channel) = slot.as_ref().filter(|c| c.is_open()) {
                return Ok(Arc::clone(channel));
            }
        }
        debug!("No open broker channel, connecting");
        self.open().await
    }

    /// Close the channel. Exclusive queues bound through it are deleted.
    pub async fn close(&self) -> Result<(), BrokerError> {
        let channel = self.channel.lock().await.take();
        if let Some(channel) = channel {
            channel.close().await?;
            info!(exchange = %self.exchange.name, "Broker connection closed");
        }
        Ok(())
    }

    /// Whether a usable channel is held.
    pub async fn is_open(&self) -> bool {
        self.channel
            .lock()
            .await
            .as_ref()
            .is_some_and(|c| c.is_open())
    }

    /// The exchange this connection declares.
    #[must_use]
    pub fn exchange(&self) -> &ExchangeSpec {
        &self.exchange
    }

    /// The configuration this connection was built with.
    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}
