use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{Post, StoreError};
use crate::ports::outbound::PostRepository;

/// In-process post store.
///
/// Used by tests and single-node deployments. Can be switched unavailable to
/// exercise store-failure paths.
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<String, Post>>,
    available: AtomicBool,
}

impl InMemoryPostRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("post store offline".to_string()))
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, post: &Post) -> Result<(), StoreError> {
        self.check_available()?;
        let mut posts = self.posts.write();
        if posts.contains_key(&post.id) {
            return Err(StoreError::DuplicateKey(post.id.clone()));
        }
        posts.insert(post.id.clone(), post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, StoreError> {
        self.check_available()?;
        Ok(self.posts.read().get(id).cloned())
    }

    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<Option<Post>, StoreError> {
        self.check_available()?;
        let mut posts = self.posts.write();
        match posts.get(id) {
            Some(post) if post.is_owned_by(user_id) => Ok(posts.remove(id)),
            _ => Ok(None),
        }
    }

    async fn list_newest(&self, skip: u64, limit: u32) -> Result<Vec<Post>, StoreError> {
        self.check_available()?;
        let mut posts: Vec<Post> = self.posts.read().values().cloned().collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(posts
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.posts.read().len() as u64)
    }
}
