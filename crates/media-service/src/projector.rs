//! # Media Projector
//!
//! On `post.deleted`, removes every media asset the post referenced: first
//! the blob, then the record. Media already gone is skipped and a blob the
//! object store no longer has counts as deleted, so a redelivered event
//! finishes whatever a previous attempt left behind.

use std::sync::Arc;

use async_trait::async_trait;
use shared_bus::{EventHandler, HandlerError};
use shared_types::{DomainEvent, PostDeleted, POST_DELETED};
use tracing::{debug, info, warn};

use crate::domain::BlobError;
use crate::ports::{BlobStore, MediaStore};

/// Handler bound to `post.deleted`.
pub struct MediaProjector {
    media: Arc<dyn MediaStore>,
    blobs: Arc<dyn BlobStore>,
}

impl MediaProjector {
    #[must_use]
    pub fn new(media: Arc<dyn MediaStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { media, blobs }
    }

    async fn on_deleted(&self, event: PostDeleted) -> Result<(), HandlerError> {
        if event.media_ids.is_empty() {
            debug!(post_id = %event.post_id, "Post had no media");
            return Ok(());
        }

        let records = self
            .media
            .find_many(&event.media_ids)
            .await
            .map_err(|e| HandlerError::Store(e.to_string()))?;

        for record in &records {
            match self.blobs.delete(&record.public_id).await {
                Ok(()) => {}
                Err(BlobError::NotFound(_)) => {
                    debug!(public_id = %record.public_id, "Blob already deleted");
                }
                Err(e @ BlobError::Unavailable(_)) => {
                    return Err(HandlerError::Downstream(e.to_string()));
                }
            }
            self.media
                .delete(&record.id)
                .await
                .map_err(|e| HandlerError::Store(e.to_string()))?;
            info!(
                media_id = %record.id,
                public_id = %record.public_id,
                post_id = %event.post_id,
                "Deleted media"
            );
        }

        info!(
            post_id = %event.post_id,
            processed = records.len(),
            "Processed media of deleted post"
        );
        Ok(())
    }
}

#[async_trait]
impl EventHandler for MediaProjector {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event.routing_key().as_str() {
            POST_DELETED => self.on_deleted(event.decode()?).await,
            other => {
                warn!(routing_key = other, "Unexpected event for media projection");
                Ok(())
            }
        }
    }
}
