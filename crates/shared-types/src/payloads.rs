//! # Post Lifecycle Payloads
//!
//! Field names are camelCase on the wire so every service, whatever it is
//! written in, reads the same JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::EventPayload;
use crate::{POST_CREATED, POST_DELETED};

/// Identifier of an authoritative post record.
pub type PostId = String;

/// Identifier of the user owning a post.
pub type UserId = String;

/// Identifier of a media asset attached to a post.
pub type MediaId = String;

/// Published by the post service after a post is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreated {
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
    #[serde(default)]
    pub media_ids: Vec<MediaId>,
    pub created_at: DateTime<Utc>,
}

impl EventPayload for PostCreated {
    const ROUTING_KEY: &'static str = POST_CREATED;
}

/// Published by the post service after a post is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDeleted {
    pub post_id: PostId,
    pub user_id: UserId,
    #[serde(default)]
    pub media_ids: Vec<MediaId>,
}

impl EventPayload for PostDeleted {
    const ROUTING_KEY: &'static str = POST_DELETED;
}
