//! # Outbound Ports (Driven Ports)

use async_trait::async_trait;

use crate::domain::{Post, StoreError};

/// Authoritative post storage.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post. Fails with `DuplicateKey` if the id is taken.
    async fn insert(&self, post: &Post) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, StoreError>;

    /// Delete the post if it exists and is owned by `user_id`.
    ///
    /// Returns the removed post, or `None` when nothing matched.
    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<Option<Post>, StoreError>;

    /// Posts ordered newest first, after skipping `skip` of them.
    async fn list_newest(&self, skip: u64, limit: u32) -> Result<Vec<Post>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
