//! # Search Service
//!
//! Maintains a searchable projection of posts. The projection is derived
//! state: it is written only by [`SearchProjector`] from `post.created` and
//! `post.deleted` events, and may briefly lag the post service.
//!
//! ## Startup Contract
//!
//! Both subscriptions are bound before the service reports ready, so no event
//! published after readiness is lost for lack of a queue.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod projector;
pub mod router;
pub mod service;

pub use adapters::InMemorySearchStore;
pub use config::{ConfigError, ServiceConfig};
pub use domain::{SearchQuery, SearchRecord, StoreError, MAX_RESULTS};
pub use ports::SearchStore;
pub use projector::SearchProjector;
pub use router::{build_router, AppState};
pub use service::SearchService;

/// Routing keys the search projection binds.
pub const BINDINGS: [&str; 2] = [shared_types::POST_CREATED, shared_types::POST_DELETED];
