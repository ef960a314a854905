//! Admission control configuration with validation.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One fixed-window tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Requests admitted per window and client.
    pub points: u64,
    /// Window length in seconds.
    pub duration_secs: u64,
    /// Counter key namespace, e.g. `middleware` gives `middleware:<ip>`.
    pub key_prefix: String,
}

impl TierConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Short-window throughput ceiling shared by every route.
    #[must_use]
    pub fn global_default() -> Self {
        Self {
            points: 10,
            duration_secs: 1,
            key_prefix: "middleware".to_string(),
        }
    }

    /// Long-window quota for mutating routes.
    #[must_use]
    pub fn sensitive_default() -> Self {
        Self {
            points: 50,
            duration_secs: 15 * 60,
            key_prefix: "sensitive".to_string(),
        }
    }

    fn validate(&self, tier: &str) -> Result<(), AdmissionConfigError> {
        if self.points == 0 {
            return Err(AdmissionConfigError::InvalidRateLimit(format!(
                "{tier}.points cannot be 0"
            )));
        }
        if self.duration_secs == 0 {
            return Err(AdmissionConfigError::InvalidRateLimit(format!(
                "{tier}.duration_secs cannot be 0"
            )));
        }
        if self.key_prefix.is_empty() {
            return Err(AdmissionConfigError::Invalid(format!(
                "{tier}.key_prefix cannot be empty"
            )));
        }
        Ok(())
    }
}

/// Admission control configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Enable admission control
    pub enabled: bool,
    /// IPs that are never limited
    pub whitelist: Vec<IpAddr>,
    /// Direct peers whose `X-Forwarded-For` / `X-Real-IP` headers are honored.
    /// Every other peer is keyed by its socket address.
    pub trusted_proxies: Vec<IpAddr>,
    /// Tier applied to every request
    pub global: TierConfig,
    /// Tier applied on top of `global` for sensitive routes
    pub sensitive: TierConfig,
    /// Route patterns the sensitive tier applies to, e.g. `/api/posts/delete-post/:id`.
    /// A pattern also covers every path below it.
    pub sensitive_routes: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            whitelist: Vec::new(),
            trusted_proxies: Vec::new(),
            global: TierConfig::global_default(),
            sensitive: TierConfig::sensitive_default(),
            sensitive_routes: Vec::new(),
        }
    }
}

impl AdmissionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), AdmissionConfigError> {
        self.global.validate("global")?;
        self.sensitive.validate("sensitive")?;
        if self.global.key_prefix == self.sensitive.key_prefix {
            return Err(AdmissionConfigError::Invalid(
                "global and sensitive tiers must use different key prefixes".into(),
            ));
        }
        if let Some(route) = self.sensitive_routes.iter().find(|r| !r.starts_with('/')) {
            return Err(AdmissionConfigError::Invalid(format!(
                "sensitive route '{route}' must start with '/'"
            )));
        }
        Ok(())
    }

    /// Whether `path` falls under one of the sensitive route patterns.
    ///
    /// `:name` segments match any single segment; a pattern matches its own
    /// path and everything below it.
    #[must_use]
    pub fn is_sensitive(&self, path: &str) -> bool {
        self.sensitive_routes
            .iter()
            .any(|pattern| route_covers(pattern, path))
    }

    /// Whether forwarding headers from the direct peer `ip` may be believed.
    #[must_use]
    pub fn is_trusted_proxy(&self, ip: IpAddr) -> bool {
        self.trusted_proxies.contains(&ip)
    }
}

fn route_covers(pattern: &str, path: &str) -> bool {
    let mut path_segments = path.split('/').filter(|s| !s.is_empty());
    for expected in pattern.split('/').filter(|s| !s.is_empty()) {
        match path_segments.next() {
            Some(_) if expected.starts_with(':') => {}
            Some(actual) if actual == expected => {}
            _ => return false,
        }
    }
    true
}

/// Configuration validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionConfigError {
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
