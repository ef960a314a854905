//! # Media Service

use std::sync::Arc;

use shared_types::UserId;
use tracing::info;

use crate::domain::{MediaRecord, NewMedia, StoreError};
use crate::ports::MediaStore;

/// Media record use cases.
pub struct MediaService {
    store: Arc<dyn MediaStore>,
}

impl MediaService {
    #[must_use]
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// Record an uploaded blob as media owned by `user_id`.
    pub async fn register(
        &self,
        user_id: impl Into<UserId>,
        media: NewMedia,
    ) -> Result<MediaRecord, StoreError> {
        let record = MediaRecord::new(user_id, media);
        self.store.insert(record.clone()).await?;
        info!(media_id = %record.id, public_id = %record.public_id, "Media registered");
        Ok(record)
    }

    pub async fn list_all(&self) -> Result<Vec<MediaRecord>, StoreError> {
        self.store.list_all().await
    }
}
