//! # Post Lifecycle Flows
//!
//! Mutations on the post service reaching the search and media projections,
//! and the post service's own cache staying in step with its store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use admission_control::{
        AdmissionConfig, AdmissionController, AdmissionLayer, InMemoryCounterStore, USER_ID_HEADER,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use post_service::{NewPost, PageRequest, PostPage};
    use serde_json::Value;
    use shared_bus::ReadinessGate;
    use tower::ServiceExt;

    use crate::integration::fixtures::{eventually, Deployment};

    fn new_post(content: &str, media_ids: Vec<String>) -> NewPost {
        NewPost {
            content: content.to_string(),
            media_ids,
        }
    }

    fn admission() -> AdmissionLayer {
        AdmissionLayer::new(Arc::new(AdmissionController::new(
            Arc::new(InMemoryCounterStore::new()),
            AdmissionConfig::default(),
        )))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_created_post_becomes_searchable() {
        let deployment = Deployment::start().await;

        let post = deployment
            .posts
            .service
            .create_post("u1", new_post("Rust at the edge", Vec::new()))
            .await
            .unwrap();
        assert_eq!(deployment.posts.service.events_published(), 1);

        eventually(|| deployment.search.store.get(&post.id).is_some()).await;
        let hits = deployment.search.service.search("rust").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post_id, post.id);
        assert_eq!(hits[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_deleting_post_cleans_every_projection() {
        let deployment = Deployment::start().await;
        let photo = deployment.media.upload("u1", "sunset").await;
        let untouched = deployment.media.upload("u1", "unrelated").await;

        let post = deployment
            .posts
            .service
            .create_post("u1", new_post("sunset tonight", vec![photo.id.clone()]))
            .await
            .unwrap();
        eventually(|| deployment.search.store.len() == 1).await;

        deployment
            .posts
            .service
            .delete_post("u1", &post.id)
            .await
            .unwrap();

        assert!(deployment.posts.repository.is_empty());
        eventually(|| deployment.search.store.is_empty()).await;
        eventually(|| !deployment.media.store.contains(&photo.id)).await;
        assert!(!deployment.media.blobs.contains(&photo.public_id));
        assert!(deployment.media.store.contains(&untouched.id));
        assert!(deployment.media.blobs.contains(&untouched.public_id));
    }

    #[tokio::test]
    async fn test_create_invalidates_cached_listing() {
        let deployment = Deployment::start().await;
        let posts = &deployment.posts.service;
        posts
            .create_post("u1", new_post("first", Vec::new()))
            .await
            .unwrap();

        let first = posts.list_posts(PageRequest::default()).await.unwrap();
        assert!(!first.is_hit());
        let cached = posts.list_posts(PageRequest::default()).await.unwrap();
        assert!(cached.is_hit());
        assert_eq!(cached.body(), first.body());

        posts
            .create_post("u2", new_post("second", Vec::new()))
            .await
            .unwrap();

        let fresh = posts.list_posts(PageRequest::default()).await.unwrap();
        assert!(!fresh.is_hit());
        let page: PostPage = fresh.decode().unwrap();
        assert_eq!(page.total_posts, 2);
        assert!(page.posts.iter().any(|p| p.content == "second"));
    }

    #[tokio::test]
    async fn test_deleted_post_is_not_served_from_cache() {
        let deployment = Deployment::start().await;
        let posts = &deployment.posts.service;
        let post = posts
            .create_post("u1", new_post("short lived", Vec::new()))
            .await
            .unwrap();

        assert!(!posts.get_post(&post.id).await.unwrap().unwrap().is_hit());
        assert!(posts.get_post(&post.id).await.unwrap().unwrap().is_hit());

        posts.delete_post("u1", &post.id).await.unwrap();

        assert!(posts.get_post(&post.id).await.unwrap().is_none());
        // A miss for a missing post leaves nothing behind to serve later.
        assert!(posts.get_post(&post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_broker_outage_does_not_fail_create() {
        let deployment = Deployment::start().await;
        deployment.transport.set_online(false);

        let post = deployment
            .posts
            .service
            .create_post("u1", new_post("offline", Vec::new()))
            .await
            .unwrap();

        assert_eq!(deployment.posts.repository.len(), 1);
        assert_eq!(deployment.posts.service.events_published(), 0);
        assert!(deployment.search.store.get(&post.id).is_none());
    }

    #[tokio::test]
    async fn test_http_create_then_search() {
        let deployment = Deployment::start().await;
        let post_router: Router = post_service::build_router(
            post_service::AppState {
                service: Arc::clone(&deployment.posts.service),
                readiness: ReadinessGate::new(),
            },
            admission(),
        );
        let search_router: Router = search_service::build_router(
            search_service::AppState {
                service: Arc::new(search_service::SearchService::new(
                    deployment.search.store.clone(),
                )),
                readiness: ReadinessGate::new(),
            },
            admission(),
        );

        let response = post_router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/posts/create-post")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(USER_ID_HEADER, "u7")
                    .body(Body::from(r#"{"content":"Ferris says hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let post_id = created["post"].as_str().unwrap().to_string();

        eventually(|| deployment.search.store.get(&post_id).is_some()).await;

        let response = search_router
            .oneshot(
                Request::builder()
                    .uri("/api/search/posts?query=ferris")
                    .header(USER_ID_HEADER, "u8")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["postId"], post_id.as_str());
        assert_eq!(body["data"][0]["userId"], "u7");
    }
}
