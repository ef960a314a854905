//! Caller identity forwarded by the gateway.
//!
//! Token verification happens upstream; services only see the resulting user
//! id in the `x-user-id` header. Handlers that act on behalf of a user take a
//! [`CallerIdentity`] and answer 401 when the header is missing.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

/// Header the gateway sets after authenticating a request.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl CallerIdentity {
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.0
    }
}

/// Rejection for requests without a usable `x-user-id`.
#[derive(Debug, Clone, Copy)]
pub struct MissingIdentity;

impl IntoResponse for MissingIdentity {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Unauthorized",
                "success": false,
                "message": "Authentication required, please login to continue",
            })),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = MissingIdentity;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match user_id {
            Some(id) => Ok(Self(id.to_string())),
            None => {
                warn!(path = %parts.uri.path(), "Unauthorized request");
                Err(MissingIdentity)
            }
        }
    }
}
