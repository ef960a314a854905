//! # Domain Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{MediaId, PostCreated, PostDeleted, PostId, UserId};
use uuid::Uuid;

use crate::domain::errors::PostError;

/// Upper bound on post content, in characters.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// An authoritative post record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub media_ids: Vec<MediaId>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Build a post with a fresh id, stamped now.
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, input: NewPost) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            user_id: user_id.into(),
            content: input.content,
            media_ids: input.media_ids,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Event announcing this post to the other services.
    #[must_use]
    pub fn created_event(&self) -> PostCreated {
        PostCreated {
            post_id: self.id.clone(),
            user_id: self.user_id.clone(),
            content: self.content.clone(),
            media_ids: self.media_ids.clone(),
            created_at: self.created_at,
        }
    }

    /// Event announcing the removal of this post.
    #[must_use]
    pub fn deleted_event(&self) -> PostDeleted {
        PostDeleted {
            post_id: self.id.clone(),
            user_id: self.user_id.clone(),
            media_ids: self.media_ids.clone(),
        }
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media_ids: Vec<MediaId>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), PostError> {
        let chars = self.content.chars().count();
        if chars == 0 {
            return Err(PostError::InvalidPost(
                "\"content\" is not allowed to be empty".to_string(),
            ));
        }
        if chars > MAX_CONTENT_CHARS {
            return Err(PostError::InvalidPost(format!(
                "\"content\" length must be less than or equal to {MAX_CONTENT_CHARS} characters long"
            )));
        }
        if self.media_ids.iter().any(|id| id.is_empty()) {
            return Err(PostError::InvalidPost(
                "\"mediaIds\" must not contain empty ids".to_string(),
            ));
        }
        Ok(())
    }
}

/// Requested page of the newest-first post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Missing or zero values fall back to page 1 and 10 posts per page.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(Self::DEFAULT_PAGE),
            limit: limit.filter(|l| *l > 0).unwrap_or(Self::DEFAULT_LIMIT),
        }
    }

    /// Number of posts before this page.
    #[must_use]
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of the listing, as it is cached under `posts:<page>:<limit>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total_posts: u64,
}

impl PostPage {
    #[must_use]
    pub fn new(posts: Vec<Post>, request: PageRequest, total_posts: u64) -> Self {
        Self {
            posts,
            current_page: request.page,
            total_pages: total_posts.div_ceil(u64::from(request.limit)),
            total_posts,
        }
    }
}
