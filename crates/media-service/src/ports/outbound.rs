//! # Outbound Ports (Driven Ports)

use async_trait::async_trait;

use crate::domain::{BlobError, MediaRecord, StoreError};

/// Media record storage.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn insert(&self, record: MediaRecord) -> Result<(), StoreError>;

    /// Records for the ids that still exist. Unknown ids are skipped.
    async fn find_many(&self, ids: &[String]) -> Result<Vec<MediaRecord>, StoreError>;

    /// Delete by id. Returns whether the record existed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn list_all(&self) -> Result<Vec<MediaRecord>, StoreError>;
}

/// Object storage holding the media bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Remove a blob. `NotFound` when it is already gone.
    async fn delete(&self, public_id: &str) -> Result<(), BlobError>;
}
