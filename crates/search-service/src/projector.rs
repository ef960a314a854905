//! # Search Projector
//!
//! Projects post lifecycle events into the [`SearchStore`]. Safe to run any
//! number of times per event:
//!
//! | Event          | Store outcome        | Result       |
//! |----------------|----------------------|--------------|
//! | `post.created` | inserted             | ack          |
//! | `post.created` | duplicate key        | ack (no-op)  |
//! | `post.deleted` | deleted or not found | ack          |
//! | either         | store unavailable    | redeliver    |

use std::sync::Arc;

use async_trait::async_trait;
use shared_bus::{EventHandler, HandlerError};
use shared_types::{DomainEvent, PostCreated, PostDeleted, POST_CREATED, POST_DELETED};
use tracing::{debug, info, warn};

use crate::domain::{SearchRecord, StoreError};
use crate::ports::SearchStore;

/// Handler bound to both `post.created` and `post.deleted`.
pub struct SearchProjector {
    store: Arc<dyn SearchStore>,
}

impl SearchProjector {
    #[must_use]
    pub fn new(store: Arc<dyn SearchStore>) -> Self {
        Self { store }
    }

    async fn on_created(&self, event: PostCreated) -> Result<(), HandlerError> {
        let post_id = event.post_id.clone();
        match self.store.insert(SearchRecord::from(event)).await {
            Ok(()) => {
                info!(post_id = %post_id, "Search record created");
                Ok(())
            }
            Err(StoreError::DuplicateKey(_)) => {
                debug!(post_id = %post_id, "Search record already exists, skipping");
                Ok(())
            }
            Err(StoreError::Unavailable(reason)) => Err(HandlerError::Store(reason)),
        }
    }

    async fn on_deleted(&self, event: PostDeleted) -> Result<(), HandlerError> {
        match self.store.delete_by_post_id(&event.post_id).await {
            Ok(true) => {
                info!(post_id = %event.post_id, "Search record deleted");
                Ok(())
            }
            Ok(false) => {
                debug!(post_id = %event.post_id, "No search record to delete");
                Ok(())
            }
            Err(e) => Err(HandlerError::Store(e.to_string())),
        }
    }
}

#[async_trait]
impl EventHandler for SearchProjector {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event.routing_key().as_str() {
            POST_CREATED => self.on_created(event.decode()?).await,
            POST_DELETED => self.on_deleted(event.decode()?).await,
            other => {
                warn!(routing_key = other, "Unexpected event for search projection");
                Ok(())
            }
        }
    }
}
