//! # HTTP Router
//!
//! | Method | Path                         | Identity | Admission          |
//! |--------|------------------------------|----------|--------------------|
//! | POST   | `/api/posts/create-post`     | required | global + sensitive |
//! | GET    | `/api/posts/get-all-posts`   | -        | global             |
//! | GET    | `/api/posts/get-post/:id`    | required | global             |
//! | DELETE | `/api/posts/delete-post/:id` | required | global + sensitive |
//! | GET    | `/health`                    | -        | -                  |
//!
//! Cached reads are answered with the cached document verbatim.

use std::sync::Arc;

use admission_control::{AdmissionLayer, CallerIdentity};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use shared_bus::ReadinessGate;
use shared_cache::Snapshot;
use tracing::{error, info, warn};

use crate::domain::{NewPost, PageRequest, PostError};
use crate::service::PostService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PostService>,
    pub readiness: ReadinessGate,
}

/// Build the service router. `/health` sits outside admission control.
pub fn build_router(state: AppState, admission: AdmissionLayer) -> Router {
    Router::new()
        .route("/api/posts/create-post", post(create_post))
        .route("/api/posts/get-all-posts", get(get_all_posts))
        .route("/api/posts/get-post/:id", get(get_post))
        .route("/api/posts/delete-post/:id", delete(delete_post))
        .layer(admission)
        .route("/health", get(health))
        .with_state(state)
}

async fn create_post(
    State(state): State<AppState>,
    caller: CallerIdentity,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => {
            warn!(error = %rejection, "Invalid post data");
            return failure(PostError::InvalidPost(rejection.body_text()), "create post");
        }
    };

    match state.service.create_post(caller.user_id(), input).await {
        Ok(post) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Post created successfully",
                "post": post.id,
            })),
        )
            .into_response(),
        Err(e) => failure(e, "create post"),
    }
}

/// Lenient pagination: anything that is not a positive integer falls back to
/// the default.
#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<String>,
    limit: Option<String>,
}

impl ListParams {
    fn page_request(&self) -> PageRequest {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<u32>().ok());
        PageRequest::new(parse(&self.page), parse(&self.limit))
    }
}

async fn get_all_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let request = params.page_request();
    info!(page = request.page, limit = request.limit, "Listing posts");

    match state.service.list_posts(request).await {
        Ok(snapshot) => snapshot_response(snapshot),
        Err(e) => failure(e, "get posts"),
    }
}

async fn get_post(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<String>,
) -> Response {
    match state.service.get_post(&id).await {
        Ok(Some(snapshot)) => snapshot_response(snapshot),
        Ok(None) => failure(PostError::NotFound(id), "get post by id"),
        Err(e) => failure(e, "get post by id"),
    }
}

async fn delete_post(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Response {
    match state.service.delete_post(caller.user_id(), &id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Post deleted successfully",
            })),
        )
            .into_response(),
        Err(e) => failure(e, "delete post"),
    }
}

async fn health(State(state): State<AppState>) -> Response {
    if state.readiness.is_ready() {
        (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "starting"})),
        )
            .into_response()
    }
}

fn snapshot_response(snapshot: Snapshot) -> Response {
    let mut response = Response::new(Body::from(snapshot.into_body()));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

fn failure(err: PostError, action: &str) -> Response {
    match &err {
        PostError::InvalidPost(reason) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Invalid post data",
                "error": reason,
            })),
        )
            .into_response(),
        PostError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "message": "Post not found",
            })),
        )
            .into_response(),
        PostError::Store(_) | PostError::Cache(_) => {
            error!(action, error = %err, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Internal server error",
                    "error": format!("Failed to {action}"),
                })),
            )
                .into_response()
        }
    }
}
