use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{PostCreated, PostId, UserId};

/// Searchable copy of a post, unique on `post_id`.
///
/// Created only from `post.created`, removed only on `post.deleted`, never
/// updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<PostCreated> for SearchRecord {
    fn from(event: PostCreated) -> Self {
        Self {
            post_id: event.post_id,
            user_id: event.user_id,
            content: event.content,
            created_at: event.created_at,
        }
    }
}
