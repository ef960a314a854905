//! # HTTP Router
//!
//! | Method | Path                  | Identity | Admission          |
//! |--------|-----------------------|----------|--------------------|
//! | GET    | `/api/search/posts`   | required | global + sensitive |
//! | GET    | `/health`             | -        | -                  |

use std::sync::Arc;

use admission_control::{AdmissionLayer, CallerIdentity};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use shared_bus::ReadinessGate;
use tracing::error;

use crate::service::SearchService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub readiness: ReadinessGate,
}

/// Build the service router. `/health` sits outside admission control.
pub fn build_router(state: AppState, admission: AdmissionLayer) -> Router {
    Router::new()
        .route("/api/search/posts", get(search_posts))
        .layer(admission)
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

async fn search_posts(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(params): Query<SearchParams>,
) -> Response {
    match state.service.search(&params.query).await {
        Ok(results) => Json(json!({
            "success": true,
            "message": "Posts searched successfully",
            "data": results,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "Error searching posts");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "Internal server error", "success": false})),
            )
                .into_response()
        }
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
