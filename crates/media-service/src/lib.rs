//! # Media Service
//!
//! Owns media records and the blobs behind them. When a post is deleted, the
//! [`MediaProjector`] removes the media it referenced.

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

pub use adapters::{InMemoryBlobStore, InMemoryMediaStore};
pub use config::{ConfigError, ServiceConfig};
pub use domain::{BlobError, MediaRecord, NewMedia, StoreError};
pub use ports::{BlobStore, MediaStore};
pub use projector::MediaProjector;
pub use router::{build_router, AppState};
pub use service::MediaService;

/// Routing key the media projection binds.
pub const BINDING: &str = shared_types::POST_DELETED;
