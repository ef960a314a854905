//! Environment variable overrides.

use std::env;
use std::fmt::{Debug, Display};
use std::str::FromStr;

use admission_control::AdmissionConfig;
use shared_bus::BrokerConfig;
use tracing::{info, warn};

/// Replace `target` with the parsed value of `name`, if set and parseable.
pub fn override_from_env<T>(name: &str, target: &mut T)
where
    T: FromStr + Display,
{
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(name, value = %raw, "Ignoring unparseable environment variable"),
        },
        Err(_) => info!(name, default = %target, "Environment variable not set, using default"),
    }
}

/// Replace `target` with the comma-separated list in `name`.
///
/// The whole list is rejected if any entry fails to parse. Empty entries are
/// skipped, so an empty value clears the list.
pub fn override_list_from_env<T>(name: &str, target: &mut Vec<T>)
where
    T: FromStr + Debug,
{
    let raw = match env::var(name) {
        Ok(raw) => raw,
        Err(_) => {
            info!(name, default = ?target, "Environment variable not set, using default");
            return;
        }
    };

    let parsed: Result<Vec<T>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::parse)
        .collect();
    match parsed {
        Ok(values) => *target = values,
        Err(_) => warn!(name, value = %raw, "Ignoring unparseable environment variable"),
    }
}

/// Apply the variables every service shares.
pub fn apply_shared_env(
    redis_url: &mut String,
    broker: &mut BrokerConfig,
    admission: &mut AdmissionConfig,
) {
    override_from_env("REDIS_URL", redis_url);
    override_from_env("RABBITMQ_URL", &mut broker.url);
    override_from_env("EXCHANGE_NAME", &mut broker.exchange);
    override_from_env("RATE_LIMIT_POINTS", &mut admission.global.points);
    override_from_env(
        "RATE_LIMIT_DURATION_SECS",
        &mut admission.global.duration_secs,
    );
    override_from_env("SENSITIVE_LIMIT_MAX", &mut admission.sensitive.points);
    override_from_env(
        "SENSITIVE_LIMIT_WINDOW_SECS",
        &mut admission.sensitive.duration_secs,
    );
    override_list_from_env("TRUSTED_PROXIES", &mut admission.trusted_proxies);
}
