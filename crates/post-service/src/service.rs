//! # Post Service
//!
//! Every mutation runs the same three steps, in order:
//!
//! 1. persist to the [`PostRepository`]
//! 2. invalidate `post:<id>` and every `posts:*` page
//! 3. publish `post.created` / `post.deleted`
//! 4. sweep the same keys again for snapshots written back by readers that
//!    were already loading when step 1 committed
//!
//! The caller hears back only after step 4, so a reader that arrives after
//! the response never sees a cached snapshot from before the mutation. A
//! failed invalidation fails the request. A failed publish or second sweep is
//! logged: the record is already stored, derived stores catch up from later
//! events, and a stale snapshot expires with its TTL.

use std::sync::Arc;

use shared_bus::EventPublisher;
use shared_cache::{CacheAside, Snapshot};
use shared_types::{DomainEvent, EventPayload};
use tracing::{info, warn};

use crate::domain::{NewPost, PageRequest, Post, PostError, PostPage, StoreError};
use crate::ports::PostRepository;

/// Post use cases.
pub struct PostService {
    repository: Arc<dyn PostRepository>,
    cache: CacheAside,
    publisher: Arc<dyn EventPublisher>,
}

impl PostService {
    #[must_use]
    pub fn new(
        repository: Arc<dyn PostRepository>,
        cache: CacheAside,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            cache,
            publisher,
        }
    }

    /// Validate, persist, invalidate, then announce a new post.
    pub async fn create_post(&self, user_id: &str, input: NewPost) -> Result<Post, PostError> {
        info!(user_id, "Creating post");
        if let Err(e) = input.validate() {
            warn!(user_id, error = %e, "Invalid post data");
            return Err(e);
        }

        let post = Post::new(user_id, input);
        self.repository.insert(&post).await?;
        self.cache.invalidate(&post.id).await?;
        self.publish(&post.created_event()).await;
        self.evict_stale(&post.id).await;

        info!(post_id = %post.id, user_id, "Post created");
        Ok(post)
    }

    /// Delete a post owned by `user_id`, invalidate, then announce it.
    ///
    /// A post that does not exist or belongs to someone else is `NotFound`.
    pub async fn delete_post(&self, user_id: &str, post_id: &str) -> Result<Post, PostError> {
        info!(post_id, user_id, "Deleting post");
        let Some(post) = self.repository.delete_owned(post_id, user_id).await? else {
            warn!(post_id, user_id, "Post not found");
            return Err(PostError::NotFound(post_id.to_string()));
        };

        self.cache.invalidate(&post.id).await?;
        self.publish(&post.deleted_event()).await;
        self.evict_stale(&post.id).await;

        info!(post_id, user_id, "Post deleted");
        Ok(post)
    }

    /// Serialized post from `post:<id>`, loading it on a miss.
    ///
    /// `None` when the post does not exist; that answer is never cached.
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Snapshot>, PostError> {
        let repository = Arc::clone(&self.repository);
        let snapshot = self
            .cache
            .get_entity(post_id, || async move {
                repository
                    .find_by_id(post_id)
                    .await
                    .map_err(PostError::from)
            })
            .await?;

        if snapshot.is_none() {
            warn!(post_id, "Post not found");
        }
        Ok(snapshot)
    }

    /// Serialized newest-first page from `posts:<page>:<limit>`, loading it
    /// on a miss.
    pub async fn list_posts(&self, request: PageRequest) -> Result<Snapshot, PostError> {
        let repository = Arc::clone(&self.repository);
        let snapshot = self
            .cache
            .get_collection(request.page, request.limit, || async move {
                let posts = repository.list_newest(request.skip(), request.limit).await?;
                let total = repository.count().await?;
                Ok::<_, PostError>(Some(PostPage::new(posts, request, total)))
            })
            .await?;

        snapshot.ok_or_else(|| {
            PostError::Store(StoreError::Unavailable("page loader returned nothing".into()))
        })
    }

    /// Total events handed to the broker by this service.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.publisher.events_published()
    }

    async fn evict_stale(&self, post_id: &str) {
        if let Err(e) = self.cache.evict_stale(post_id).await {
            warn!(
                post_id,
                error = %e,
                "Second cache sweep failed, stale snapshots expire by TTL"
            );
        }
    }

    async fn publish<T: EventPayload>(&self, payload: &T) {
        let event = match DomainEvent::from_payload(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(routing_key = T::ROUTING_KEY, error = %e, "Failed to encode event");
                return;
            }
        };
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                routing_key = T::ROUTING_KEY,
                error = %e,
                "Event not published, derived stores will miss this mutation"
            );
        }
    }
}
