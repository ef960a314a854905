//! # HTTP Router
//!
//! | Method | Path                 | Identity | Admission |
//! |--------|----------------------|----------|-----------|
//! | GET    | `/api/media/get-all` | required | global    |
//! | GET    | `/health`            | -        | -         |

use std::sync::Arc;

use admission_control::{AdmissionLayer, CallerIdentity};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use shared_bus::ReadinessGate;
use tracing::error;

use crate::service::MediaService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MediaService>,
    pub readiness: ReadinessGate,
}

/// Build the service router. `/health` sits outside admission control.
pub fn build_router(state: AppState, admission: AdmissionLayer) -> Router {
    Router::new()
        .route("/api/media/get-all", get(get_all_media))
        .layer(admission)
        .route("/health", get(health))
        .with_state(state)
}

async fn get_all_media(State(state): State<AppState>, _caller: CallerIdentity) -> Response {
    match state.service.list_all().await {
        Ok(medias) => Json(json!({ "medias": medias })).into_response(),
        Err(e) => {
            error!(error = %e, "Error getting all medias");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryMediaStore;
    use crate::domain::NewMedia;
    use admission_control::{AdmissionConfig, AdmissionController, InMemoryCounterStore};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn app(store: Arc<InMemoryMediaStore>) -> (Router, Arc<MediaService>) {
        let service = Arc::new(MediaService::new(store));
        let controller = Arc::new(AdmissionController::new(
            Arc::new(InMemoryCounterStore::new()),
            AdmissionConfig::default(),
        ));
        let router = build_router(
            AppState {
                service: Arc::clone(&service),
                readiness: ReadinessGate::new(),
            },
            AdmissionLayer::new(controller),
        );
        (router, service)
    }

    fn list_request() -> Request<Body> {
        Request::builder()
            .uri("/api/media/get-all")
            .header("x-user-id", "u1")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_lists_registered_media() {
        let (router, service) = app(Arc::new(InMemoryMediaStore::new()));
        let record = service
            .register(
                "u1",
                NewMedia {
                    public_id: "media/u1/a".to_string(),
                    original_name: "a.png".to_string(),
                    mime_type: "image/png".to_string(),
                    url: "https://cdn.example.com/a.png".to_string(),
                },
            )
            .await
            .unwrap();

        let response = router.oneshot(list_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["medias"][0]["id"], record.id.as_str());
        assert_eq!(json["medias"][0]["publicId"], "media/u1/a");
        assert_eq!(json["medias"][0]["mimeType"], "image/png");
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let store = Arc::new(InMemoryMediaStore::new());
        store.set_available(false);
        let (router, _) = app(store);

        let response = router.oneshot(list_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health_before_ready() {
        let (router, _) = app(Arc::new(InMemoryMediaStore::new()));
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
