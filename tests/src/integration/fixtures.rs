//! One process hosting every service over a shared in-memory broker.
//!
//! Each service gets its own connection, like separate deployments would.
//! Consumers are bound before the post service is handed out so nothing it
//! publishes is dropped for lack of a queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use media_service::{
    InMemoryBlobStore, InMemoryMediaStore, MediaProjector, MediaRecord, MediaService, NewMedia,
};
use post_service::{InMemoryPostRepository, PostService};
use search_service::{InMemorySearchStore, SearchProjector, SearchService};
use shared_bus::{
    BrokerConfig, BrokerConnection, BrokerPublisher, EventConsumer, InMemoryTransport,
    ReadinessGate, Subscription,
};
use shared_cache::{CacheAside, CacheConfig, CacheKeys, InMemoryCacheStore};
use shared_types::{PostCreated, PostDeleted};
use tokio::time::{sleep, timeout};

pub fn broker_config() -> BrokerConfig {
    BrokerConfig {
        redelivery_delay_ms: 1,
        ..BrokerConfig::default()
    }
}

pub fn connect(transport: &InMemoryTransport) -> Arc<BrokerConnection> {
    Arc::new(BrokerConnection::new(
        Arc::new(transport.clone()),
        broker_config(),
    ))
}

/// Poll until `condition` holds, failing the test after one second.
pub async fn eventually(condition: impl Fn() -> bool) {
    timeout(Duration::from_secs(1), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached");
}

pub fn created(post_id: &str, content: &str) -> PostCreated {
    PostCreated {
        post_id: post_id.to_string(),
        user_id: "u1".to_string(),
        content: content.to_string(),
        media_ids: Vec::new(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn deleted(post_id: &str, media_ids: &[&str]) -> PostDeleted {
    PostDeleted {
        post_id: post_id.to_string(),
        user_id: "u1".to_string(),
        media_ids: media_ids.iter().map(|id| id.to_string()).collect(),
    }
}

pub struct SearchNode {
    pub store: Arc<InMemorySearchStore>,
    pub service: SearchService,
    pub readiness: ReadinessGate,
    pub subscriptions: Vec<Subscription>,
}

impl SearchNode {
    pub async fn start(transport: &InMemoryTransport) -> Self {
        let store = Arc::new(InMemorySearchStore::new());
        let readiness = ReadinessGate::new();
        let consumer = EventConsumer::new(connect(transport)).with_readiness(readiness.clone());
        let projector = Arc::new(SearchProjector::new(store.clone()));

        let mut subscriptions = Vec::new();
        for binding in search_service::BINDINGS {
            subscriptions.push(consumer.subscribe(binding, projector.clone()).await.unwrap());
        }
        readiness.mark_ready();

        Self {
            service: SearchService::new(store.clone()),
            store,
            readiness,
            subscriptions,
        }
    }

    pub fn acked(&self) -> u64 {
        self.subscriptions.iter().map(|s| s.stats().acked).sum()
    }

    pub fn requeued(&self) -> u64 {
        self.subscriptions.iter().map(|s| s.stats().requeued).sum()
    }
}

pub struct MediaNode {
    pub store: Arc<InMemoryMediaStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub service: MediaService,
    pub readiness: ReadinessGate,
    pub subscription: Subscription,
}

impl MediaNode {
    pub async fn start(transport: &InMemoryTransport) -> Self {
        let store = Arc::new(InMemoryMediaStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let projector = Arc::new(MediaProjector::new(store.clone(), blobs.clone()));
        let readiness = ReadinessGate::new();
        let subscription = EventConsumer::new(connect(transport))
            .with_readiness(readiness.clone())
            .subscribe(media_service::BINDING, projector)
            .await
            .unwrap();
        readiness.mark_ready();

        Self {
            service: MediaService::new(store.clone()),
            store,
            blobs,
            readiness,
            subscription,
        }
    }

    /// Store a blob and register it as media owned by `user_id`.
    pub async fn upload(&self, user_id: &str, name: &str) -> MediaRecord {
        let public_id = format!("blob-{name}");
        self.blobs.put(public_id.clone());
        self.service
            .register(
                user_id,
                NewMedia {
                    public_id,
                    original_name: name.to_string(),
                    mime_type: "image/png".to_string(),
                    url: format!("https://cdn.example.com/{name}"),
                },
            )
            .await
            .unwrap()
    }
}

pub struct PostNode {
    pub repository: Arc<InMemoryPostRepository>,
    pub service: Arc<PostService>,
}

impl PostNode {
    pub fn start(transport: &InMemoryTransport) -> Self {
        let repository = Arc::new(InMemoryPostRepository::new());
        let service = Arc::new(PostService::new(
            repository.clone(),
            CacheAside::new(
                Arc::new(InMemoryCacheStore::new()),
                CacheKeys::posts(),
                CacheConfig::default(),
            ),
            Arc::new(BrokerPublisher::new(connect(transport))),
        ));

        Self {
            repository,
            service,
        }
    }
}

/// All three services sharing one broker.
pub struct Deployment {
    pub transport: InMemoryTransport,
    pub search: SearchNode,
    pub media: MediaNode,
    pub posts: PostNode,
}

impl Deployment {
    pub async fn start() -> Self {
        let transport = InMemoryTransport::new();
        let search = SearchNode::start(&transport).await;
        let media = MediaNode::start(&transport).await;
        let posts = PostNode::start(&transport);

        Self {
            transport,
            search,
            media,
            posts,
        }
    }
}
