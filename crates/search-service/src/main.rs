//! # Search Service Binary
//!
//! ## Startup Sequence
//!
//! 1. Install logging
//! 2. Load and validate configuration
//! 3. Connect the counter store
//! 4. Connect to the broker (backoff at boot only)
//! 5. Bind `post.created` and `post.deleted`, then mark ready
//! 6. Serve HTTP until Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use admission_control::{AdmissionController, AdmissionLayer, RedisCounterStore};
use anyhow::{Context, Result};
use search_service::{
    build_router, AppState, InMemorySearchStore, SearchProjector, SearchService, ServiceConfig,
    BINDINGS,
};
use service_telemetry::{init_telemetry, TelemetryConfig};
use shared_bus::{BrokerConfig, BrokerConnection, EventConsumer, ReadinessGate, Transport};
use tracing::{info, warn};

#[cfg(feature = "amqp")]
fn broker_transport(config: &BrokerConfig) -> Arc<dyn Transport> {
    Arc::new(shared_bus::AmqpTransport::new(config.url.clone()))
}

#[cfg(not(feature = "amqp"))]
fn broker_transport(_config: &BrokerConfig) -> Arc<dyn Transport> {
    warn!("Built without the amqp feature, events stay inside this process");
    Arc::new(shared_bus::InMemoryTransport::new())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env("search-service"))
        .context("Failed to initialize telemetry")?;

    let config = ServiceConfig::from_env();
    config.validate().context("Invalid configuration")?;

    let counter_store = RedisCounterStore::connect(&config.redis_url)
        .await
        .context("Failed to connect to counter store")?;

    let connection = Arc::new(BrokerConnection::new(
        broker_transport(&config.broker),
        config.broker.clone(),
    ));
    connection
        .open_with_retry()
        .await
        .context("Failed to connect to broker")?;

    let store = Arc::new(InMemorySearchStore::new());
    let projector = Arc::new(SearchProjector::new(store.clone()));
    let readiness = ReadinessGate::new();
    let consumer = EventConsumer::new(Arc::clone(&connection)).with_readiness(readiness.clone());

    let mut subscriptions = Vec::with_capacity(BINDINGS.len());
    for binding in BINDINGS {
        let subscription = consumer
            .subscribe(binding, projector.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {binding}"))?;
        subscriptions.push(subscription);
    }
    readiness.mark_ready();

    let controller = Arc::new(AdmissionController::new(
        Arc::new(counter_store),
        config.admission.clone(),
    ));
    let router = build_router(
        AppState {
            service: Arc::new(SearchService::new(store)),
            readiness,
        },
        AdmissionLayer::new(controller),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Search service listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    })
    .await
    .context("HTTP server error")?;

    info!("Initiating graceful shutdown...");
    for subscription in &subscriptions {
        let stats = subscription.stats();
        info!(
            binding = %subscription.binding(),
            delivered = stats.delivered,
            acked = stats.acked,
            requeued = stats.requeued,
            discarded = stats.discarded,
            "Subscription closed"
        );
    }
    drop(subscriptions);
    if let Err(e) = connection.close().await {
        warn!(error = %e, "Broker connection did not close cleanly");
    }
    Ok(())
}
