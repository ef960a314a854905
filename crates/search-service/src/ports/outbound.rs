//! # Outbound Ports (Driven Ports)

use async_trait::async_trait;

use crate::domain::{SearchQuery, SearchRecord, StoreError};

/// Projection store with a uniqueness constraint on `post_id`.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Insert a record. Fails with `DuplicateKey` when one exists for the post.
    async fn insert(&self, record: SearchRecord) -> Result<(), StoreError>;

    /// Delete the record for `post_id`. Returns whether one existed.
    async fn delete_by_post_id(&self, post_id: &str) -> Result<bool, StoreError>;

    /// Ranked matches for `query`, at most `limit`.
    async fn search(&self, query: &SearchQuery, limit: usize)
        -> Result<Vec<SearchRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
