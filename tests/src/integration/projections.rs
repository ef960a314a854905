//! # Projection Flows
//!
//! Events published on the shared exchange reach every bound projector, and
//! projectors stay correct under redelivery and store outages.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use admission_control::{
        AdmissionConfig, AdmissionController, AdmissionLayer, InMemoryCounterStore,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::json;
    use shared_bus::{BrokerPublisher, EventPublisher, DEFAULT_EXCHANGE};
    use shared_types::{DomainEvent, RoutingKey, POST_CREATED};
    use tokio::time::sleep;

    use crate::integration::fixtures::{
        connect, created, deleted, eventually, MediaNode, SearchNode,
    };
    use shared_bus::InMemoryTransport;
    use tower::ServiceExt;

    fn publisher(transport: &InMemoryTransport) -> BrokerPublisher {
        BrokerPublisher::new(connect(transport))
    }

    #[tokio::test]
    async fn test_duplicate_created_event_projects_once() {
        let transport = InMemoryTransport::new();
        let search = SearchNode::start(&transport).await;
        let publisher = publisher(&transport);

        let event = created("p1", "hello");
        publisher.publish_payload(&event).await.unwrap();
        publisher.publish_payload(&event).await.unwrap();

        eventually(|| search.acked() == 2).await;
        assert_eq!(search.store.len(), 1);
        let record = search.store.get("p1").unwrap();
        assert_eq!(record.content, "hello");
        assert_eq!(record.user_id, "u1");
    }

    #[tokio::test]
    async fn test_deleted_event_fans_out_to_search_and_media() {
        let transport = InMemoryTransport::new();
        let search = SearchNode::start(&transport).await;
        let media = MediaNode::start(&transport).await;
        let publisher = publisher(&transport);

        let photo = media.upload("u1", "photo").await;
        publisher
            .publish_payload(&created("p1", "with a photo"))
            .await
            .unwrap();
        eventually(|| search.store.len() == 1).await;

        publisher
            .publish_payload(&deleted("p1", &[photo.id.as_str()]))
            .await
            .unwrap();

        eventually(|| search.store.is_empty()).await;
        eventually(|| !media.store.contains(&photo.id)).await;
        assert!(!media.blobs.contains(&photo.public_id));
        assert_eq!(media.subscription.stats().acked, 1);
    }

    #[tokio::test]
    async fn test_binding_after_publish_receives_nothing() {
        let transport = InMemoryTransport::new();
        let early = SearchNode::start(&transport).await;
        let publisher = publisher(&transport);

        publisher
            .publish_payload(&created("p1", "before"))
            .await
            .unwrap();
        eventually(|| early.store.len() == 1).await;

        let late = SearchNode::start(&transport).await;
        sleep(Duration::from_millis(50)).await;
        assert!(late.store.is_empty());
        assert_eq!(late.acked(), 0);

        publisher
            .publish_payload(&created("p2", "after"))
            .await
            .unwrap();
        eventually(|| late.store.len() == 1 && early.store.len() == 2).await;
        assert!(late.store.get("p2").is_some());
    }

    #[tokio::test]
    async fn test_event_with_no_bound_queue_is_dropped() {
        let transport = InMemoryTransport::new();
        let publisher = publisher(&transport);

        publisher
            .publish_payload(&created("p1", "nobody listens"))
            .await
            .unwrap();

        assert_eq!(transport.messages_dropped(DEFAULT_EXCHANGE), 1);
        assert_eq!(publisher.events_published(), 1);
    }

    #[tokio::test]
    async fn test_deleting_unknown_post_is_acked() {
        let transport = InMemoryTransport::new();
        let search = SearchNode::start(&transport).await;
        let media = MediaNode::start(&transport).await;
        let publisher = publisher(&transport);

        publisher
            .publish_payload(&deleted("ghost", &["no-such-media"]))
            .await
            .unwrap();

        eventually(|| media.subscription.stats().acked == 1).await;
        eventually(|| search.acked() == 1).await;
        assert_eq!(search.requeued(), 0);
        assert_eq!(media.subscription.stats().requeued, 0);
    }

    #[tokio::test]
    async fn test_store_outage_is_redelivered_until_projected() {
        let transport = InMemoryTransport::new();
        let search = SearchNode::start(&transport).await;
        let publisher = publisher(&transport);

        search.store.set_available(false);
        publisher
            .publish_payload(&created("p1", "retry me"))
            .await
            .unwrap();
        eventually(|| search.requeued() >= 1).await;
        assert!(search.store.is_empty());

        search.store.set_available(true);
        eventually(|| search.store.len() == 1).await;
    }

    #[tokio::test]
    async fn test_malformed_payload_is_discarded() {
        let transport = InMemoryTransport::new();
        let search = SearchNode::start(&transport).await;
        let publisher = publisher(&transport);

        let garbage = DomainEvent::new(
            RoutingKey::new(POST_CREATED).unwrap(),
            json!({ "postId": 42 }),
        );
        publisher.publish(&garbage).await.unwrap();
        publisher
            .publish_payload(&created("p1", "valid"))
            .await
            .unwrap();

        eventually(|| search.store.len() == 1).await;
        let discarded: u64 = search
            .subscriptions
            .iter()
            .map(|s| s.stats().discarded)
            .sum();
        assert_eq!(discarded, 1);
        assert_eq!(search.requeued(), 0);
    }

    async fn health(router: &Router) -> StatusCode {
        router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_lost_broker_connection_turns_health_unready() {
        let transport = InMemoryTransport::new();
        let search = SearchNode::start(&transport).await;
        let router = search_service::build_router(
            search_service::AppState {
                service: Arc::new(search_service::SearchService::new(search.store.clone())),
                readiness: search.readiness.clone(),
            },
            AdmissionLayer::new(Arc::new(AdmissionController::new(
                Arc::new(InMemoryCounterStore::new()),
                AdmissionConfig::default(),
            ))),
        );
        assert_eq!(health(&router).await, StatusCode::OK);

        transport.drop_connections();

        eventually(|| search.subscriptions.iter().all(|s| !s.is_active())).await;
        assert_eq!(health(&router).await, StatusCode::SERVICE_UNAVAILABLE);

        // Nothing rebinds on its own: later events are not projected.
        publisher(&transport)
            .publish_payload(&created("p9", "after restart"))
            .await
            .unwrap();
        sleep(Duration::from_millis(20)).await;
        assert!(search.store.get("p9").is_none());
    }

    #[tokio::test]
    async fn test_lost_media_subscription_withdraws_readiness() {
        let transport = InMemoryTransport::new();
        let media = MediaNode::start(&transport).await;
        assert!(media.readiness.is_ready());

        transport.drop_connections();

        eventually(|| !media.subscription.is_active()).await;
        assert!(!media.readiness.is_ready());
    }
}
