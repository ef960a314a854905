//! # Admission Flows
//!
//! Fixed-window limits enforced in front of real service routers. The
//! services share one counter store, as they share Redis in production.

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use admission_control::{
        AdmissionConfig, AdmissionController, AdmissionLayer, CounterStore, InMemoryCounterStore,
        TierConfig, USER_ID_HEADER,
    };
    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{header, Request, StatusCode},
        response::Response,
        Router,
    };
    use post_service::config::SENSITIVE_ROUTES;
    use serde_json::{json, Value};
    use shared_bus::{InMemoryTransport, ReadinessGate};
    use tower::ServiceExt;

    use crate::integration::fixtures::{PostNode, SearchNode};

    const CLIENT: &str = "203.0.113.9";
    const LIST: &str = "/api/posts/get-all-posts";

    fn config(global_points: u64, sensitive_points: u64) -> AdmissionConfig {
        AdmissionConfig {
            global: TierConfig {
                points: global_points,
                ..TierConfig::global_default()
            },
            sensitive: TierConfig {
                points: sensitive_points,
                ..TierConfig::sensitive_default()
            },
            sensitive_routes: SENSITIVE_ROUTES.iter().map(|r| r.to_string()).collect(),
            ..AdmissionConfig::default()
        }
    }

    fn post_router(
        transport: &InMemoryTransport,
        store: Arc<dyn CounterStore>,
        config: AdmissionConfig,
    ) -> Router {
        post_service::build_router(
            post_service::AppState {
                service: PostNode::start(transport).service,
                readiness: ReadinessGate::new(),
            },
            AdmissionLayer::new(Arc::new(AdmissionController::new(store, config))),
        )
    }

    /// Attach the socket peer the server would record for `client`.
    fn from_client(mut request: Request<Body>, client: &str) -> Request<Body> {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(client.parse().unwrap(), 51000)));
        request
    }

    fn list(client: &str) -> Request<Body> {
        from_client(
            Request::builder().uri(LIST).body(Body::empty()).unwrap(),
            client,
        )
    }

    fn create(client: &str) -> Request<Body> {
        from_client(
            Request::builder()
                .method("POST")
                .uri("/api/posts/create-post")
                .header(USER_ID_HEADER, "u1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"content":"hello"}"#))
                .unwrap(),
            client,
        )
    }

    async fn send(router: &Router, request: Request<Body>) -> Response {
        router.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_p_requests_per_window_then_reset() {
        let transport = InMemoryTransport::new();
        let store = Arc::new(InMemoryCounterStore::new());
        let router = post_router(&transport, store, config(3, 50));

        for _ in 0..3 {
            assert_eq!(send(&router, list(CLIENT)).await.status(), StatusCode::OK);
        }

        let rejected = send(&router, list(CLIENT)).await;
        assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rejected.headers()[header::RETRY_AFTER], "1");
        assert_eq!(
            body_json(rejected).await,
            json!({"message": "Too many requests", "success": false})
        );

        // Another client has its own window.
        assert_eq!(
            send(&router, list("198.51.100.4")).await.status(),
            StatusCode::OK
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(send(&router, list(CLIENT)).await.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_and_sensitive_budgets_are_independent() {
        let transport = InMemoryTransport::new();
        let store = Arc::new(InMemoryCounterStore::new());
        let router = post_router(&transport, store, config(3, 2));

        // Exhaust the global tier. The refused create must not touch the
        // sensitive budget.
        for _ in 0..3 {
            assert_eq!(send(&router, list(CLIENT)).await.status(), StatusCode::OK);
        }
        let refused = send(&router, create(CLIENT)).await;
        assert_eq!(refused.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(refused.headers()[header::RETRY_AFTER], "1");

        tokio::time::advance(Duration::from_secs(1)).await;
        for _ in 0..2 {
            let admitted = send(&router, create(CLIENT)).await;
            assert_eq!(admitted.status(), StatusCode::CREATED);
        }

        let refused = send(&router, create(CLIENT)).await;
        assert_eq!(refused.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(refused.headers()[header::RETRY_AFTER], "900");

        // An exhausted sensitive tier leaves ordinary routes alone.
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(send(&router, list(CLIENT)).await.status(), StatusCode::OK);
        assert_eq!(
            send(&router, create(CLIENT)).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_budget_is_shared_across_services() {
        let transport = InMemoryTransport::new();
        let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
        let posts = post_router(&transport, Arc::clone(&store), config(2, 50));

        let search = SearchNode::start(&transport).await;
        let search_router = search_service::build_router(
            search_service::AppState {
                service: Arc::new(search.service),
                readiness: ReadinessGate::new(),
            },
            AdmissionLayer::new(Arc::new(AdmissionController::new(
                Arc::clone(&store),
                config(2, 50),
            ))),
        );
        let search_request = || {
            from_client(
                Request::builder()
                    .uri("/api/search/posts?query=hello")
                    .header(USER_ID_HEADER, "u1")
                    .body(Body::empty())
                    .unwrap(),
                CLIENT,
            )
        };

        assert_eq!(send(&posts, list(CLIENT)).await.status(), StatusCode::OK);
        assert_eq!(
            send(&search_router, search_request()).await.status(),
            StatusCode::OK
        );
        assert_eq!(
            send(&search_router, search_request()).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            send(&posts, list(CLIENT)).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
