//! # Admission Control - Shared-Store Rate Limiting
//!
//! Every instance of a service checks the same counters, so the budget holds
//! however many instances sit behind the load balancer.
//!
//! ## Tiers
//!
//! | Tier      | Default            | Key                | Applies to          |
//! |-----------|--------------------|--------------------|---------------------|
//! | global    | 10 points / 1 s    | `middleware:<ip>`  | every request       |
//! | sensitive | 50 points / 15 min | `sensitive:<ip>`   | configured routes   |
//!
//! A request is admitted only if every tier that applies admits it.
//! Rejection is expected control flow (HTTP 429 with `Retry-After`), never an
//! error; an unreachable counter store is an error (HTTP 500).
//!
//! ## Atomicity
//!
//! Each consumption is one atomic store step (`MULTI` with `SET NX PX`,
//! `INCR`, `PTTL` on Redis). No read-modify-write spans two round trips.
//!
//! ## Client IP
//!
//! Counters are keyed by the socket peer. `X-Forwarded-For` and `X-Real-IP`
//! are read only when that peer is listed in
//! [`AdmissionConfig::trusted_proxies`]; see [`extract_client_ip`].
//!
//! ## Caller Identity
//!
//! [`CallerIdentity`] extracts the gateway's `x-user-id` header for handlers
//! that act on behalf of a user.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod identity;
pub mod layer;
pub mod limiter;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::{AdmissionConfig, AdmissionConfigError, TierConfig};
pub use identity::{CallerIdentity, MissingIdentity, USER_ID_HEADER};
pub use layer::{extract_client_ip, AdmissionLayer, AdmissionService};
pub use limiter::{AdmissionController, Decision, FixedWindowLimiter, Tier};
pub use memory::{cleanup_task, InMemoryCounterStore};
pub use redis_store::RedisCounterStore;
pub use store::{AdmissionError, CounterStore, WindowState};
