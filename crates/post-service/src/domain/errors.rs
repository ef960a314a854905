//! # Domain Errors

use shared_cache::CacheError;
use shared_types::PostId;
use thiserror::Error;

/// Document store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record with the same unique key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by [`crate::PostService`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostError {
    /// The request body failed validation.
    #[error("Invalid post data: {0}")]
    InvalidPost(String),

    /// No such post, or it belongs to another user.
    #[error("Post not found: {0}")]
    NotFound(PostId),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The cache could not be invalidated; the mutation is not acknowledged.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
