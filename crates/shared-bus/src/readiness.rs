//! # Readiness Gate
//!
//! A flag a service raises once its consumers are bound and a subscription
//! lowers again if its delivery stream ends. Health checks and dependent
//! startup steps read it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Shared "subscriptions are in place" flag.
#[derive(Clone)]
pub struct ReadinessGate {
    state: Arc<watch::Sender<bool>>,
}

impl ReadinessGate {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Mark the service ready. Repeated calls are no-ops.
    pub fn mark_ready(&self) {
        if !self.state.send_replace(true) {
            info!("Service ready");
        }
    }

    /// Withdraw readiness, e.g. because a consumer lost its queue.
    pub fn mark_unready(&self, reason: &str) {
        if self.state.send_replace(false) {
            warn!(reason, "Service no longer ready");
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.state.borrow()
    }

    /// Wait until `mark_ready` has been called.
    pub async fn wait_ready(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
