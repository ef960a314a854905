//! # Fixed-Window Limiter and Two-Tier Controller
//!
//! ```text
//! request ──▶ global tier ──rejected──▶ 429
//!                 │
//!              admitted
//!                 │
//!          sensitive route? ──no──▶ admit
//!                 │
//!                yes
//!                 ▼
//!          sensitive tier ──rejected──▶ 429
//!                 │
//!                 ▼
//!               admit
//! ```
//!
//! The sensitive tier is consumed only once the global tier has admitted the
//! request, so a request the global tier rejects never spends sensitive
//! budget. Counters are keyed by client IP, which groups every client
//! behind one NAT address into a single budget.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{AdmissionConfig, TierConfig};
use crate::store::{AdmissionError, CounterStore};

/// Which limiter made a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Global,
    Sensitive,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Sensitive => f.write_str("sensitive"),
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through. `remaining` is the smallest budget left
    /// across the tiers that were consulted.
    Admitted { remaining: u64 },
    /// Refuse the request; the client may retry after `retry_after`.
    Rejected { tier: Tier, retry_after: Duration },
}

impl Decision {
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Fixed window of `points` consumptions per client over `window`.
pub struct FixedWindowLimiter {
    store: Arc<dyn CounterStore>,
    tier: Tier,
    config: TierConfig,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, tier: Tier, config: TierConfig) -> Self {
        Self {
            store,
            tier,
            config,
        }
    }

    fn key(&self, client: IpAddr) -> String {
        format!("{}:{}", self.config.key_prefix, client)
    }

    /// Consume one point for `client`.
    pub async fn consume(&self, client: IpAddr) -> Result<Decision, AdmissionError> {
        let state = self.store.consume(&self.key(client), self.config.window()).await?;

        if state.consumed > self.config.points {
            return Ok(Decision::Rejected {
                tier: self.tier,
                retry_after: state.resets_in,
            });
        }
        Ok(Decision::Admitted {
            remaining: self.config.points - state.consumed,
        })
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }
}

/// Evaluates both tiers for a request.
pub struct AdmissionController {
    global: FixedWindowLimiter,
    sensitive: FixedWindowLimiter,
    config: AdmissionConfig,
}

impl AdmissionController {
    /// Build both tiers over one shared counter store.
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, config: AdmissionConfig) -> Self {
        Self {
            global: FixedWindowLimiter::new(Arc::clone(&store), Tier::Global, config.global.clone()),
            sensitive: FixedWindowLimiter::new(store, Tier::Sensitive, config.sensitive.clone()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Decide whether `client` may call `path`.
    pub async fn check(&self, client: IpAddr, path: &str) -> Result<Decision, AdmissionError> {
        if !self.config.enabled || self.config.whitelist.contains(&client) {
            return Ok(Decision::Admitted {
                remaining: self.config.global.points,
            });
        }

        let global = self.global.consume(client).await?;
        let Decision::Admitted { remaining } = global else {
            warn!(ip = %client, path, tier = %Tier::Global, "Rate limit exceeded");
            return Ok(global);
        };

        if !self.config.is_sensitive(path) {
            return Ok(global);
        }

        match self.sensitive.consume(client).await? {
            Decision::Admitted {
                remaining: sensitive_remaining,
            } => {
                debug!(ip = %client, path, remaining = sensitive_remaining, "Sensitive route admitted");
                Ok(Decision::Admitted {
                    remaining: remaining.min(sensitive_remaining),
                })
            }
            rejected => {
                warn!(ip = %client, path, tier = %Tier::Sensitive, "Rate limit exceeded");
                Ok(rejected)
            }
        }
    }
}
