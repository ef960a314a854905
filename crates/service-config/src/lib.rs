//! # Service Config - Shared Environment Overrides
//!
//! Each service binary starts from its own defaults and layers the
//! environment on top. The variables common to every service are read here.
//!
//! | Variable                      | Target                                |
//! |-------------------------------|---------------------------------------|
//! | `REDIS_URL`                   | cache and counter store               |
//! | `RABBITMQ_URL`                | broker URL                            |
//! | `EXCHANGE_NAME`               | topic exchange                        |
//! | `RATE_LIMIT_POINTS`           | global tier points                    |
//! | `RATE_LIMIT_DURATION_SECS`    | global tier window                    |
//! | `SENSITIVE_LIMIT_MAX`         | sensitive tier points                 |
//! | `SENSITIVE_LIMIT_WINDOW_SECS` | sensitive tier window                 |
//! | `TRUSTED_PROXIES`             | comma-separated proxy IPs             |
//!
//! Unparseable values are logged and the default is kept.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod env;
pub mod error;

pub use env::{apply_shared_env, override_from_env, override_list_from_env};
pub use error::{validate_shared, ConfigError};
