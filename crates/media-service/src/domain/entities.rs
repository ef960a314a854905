use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{MediaId, UserId};
use uuid::Uuid;

/// A stored media asset and the blob that backs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: MediaId,
    /// Object store handle of the blob
    pub public_id: String,
    pub original_name: String,
    pub mime_type: String,
    pub user_id: UserId,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// An uploaded blob to register as a media record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedia {
    pub public_id: String,
    pub original_name: String,
    pub mime_type: String,
    pub url: String,
}

impl MediaRecord {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, media: NewMedia) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            public_id: media.public_id,
            original_name: media.original_name,
            mime_type: media.mime_type,
            user_id: user_id.into(),
            url: media.url,
            created_at: Utc::now(),
        }
    }
}
