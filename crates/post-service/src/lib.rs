//! # Post Service
//!
//! Owns the authoritative post record. Reads go through the shared cache;
//! mutations invalidate it and announce themselves on the topic exchange.
//!
//! ## Module Structure
//!
//! ```text
//! post-service/
//! ├── domain/     Post, page types, errors
//! ├── ports/      PostRepository
//! ├── adapters/   in-memory repository
//! ├── service.rs  persist -> invalidate -> publish
//! ├── router.rs   HTTP surface
//! └── config.rs   environment configuration
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod router;
pub mod service;

pub use adapters::InMemoryPostRepository;
pub use config::{ConfigError, ServiceConfig};
pub use domain::{NewPost, PageRequest, Post, PostError, PostPage, StoreError};
pub use ports::PostRepository;
pub use router::{build_router, AppState};
pub use service::PostService;
