//! # Shared Cache - Cache-Aside Reads with Mutation Invalidation
//!
//! Read requests consult the shared cache first and fall through to the
//! authoritative store on a miss. Every mutation of the authoritative record
//! invalidates the entity key and sweeps the whole collection namespace
//! before the mutation is reported as done.
//!
//! ## Key Space
//!
//! ```text
//! post:<id>               single entity snapshot      long TTL  (1 h)
//! posts:<page>:<limit>    serialized page of results  short TTL (5 min)
//! ```
//!
//! ## Failure Policy
//!
//! | Path        | Store failure                                     |
//! |-------------|---------------------------------------------------|
//! | read        | logged, falls through to the loader               |
//! | repopulate  | logged, loaded value still returned               |
//! | invalidate  | returned to the caller, the mutation must fail    |
//!
//! Collection keys are enumerated with `SCAN`, never `KEYS`, so a sweep does
//! not block the store.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod aside;
pub mod config;
pub mod errors;
pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use aside::{CacheAside, Snapshot, SnapshotSource};
pub use config::{CacheConfig, CacheConfigError};
pub use errors::CacheError;
pub use keys::CacheKeys;
pub use memory::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use store::CacheStore;
