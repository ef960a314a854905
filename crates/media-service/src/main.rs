//! # Media Service Binary
//!
//! ## Startup Sequence
//!
//! 1. Install logging
//! 2. Load and validate configuration
//! 3. Connect the counter store
//! 4. Connect to the broker (backoff at boot only)
//! 5. Bind `post.deleted`, then mark ready
//! 6. Serve HTTP until Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use admission_control::{AdmissionController, AdmissionLayer, RedisCounterStore};
use anyhow::{Context, Result};
use media_service::{
    build_router, AppState, InMemoryBlobStore, InMemoryMediaStore, MediaProjector, MediaService,
    ServiceConfig, BINDING,
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
    let _telemetry = init_telemetry(TelemetryConfig::from_env("media-service"))
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

    let media = Arc::new(InMemoryMediaStore::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let projector = Arc::new(MediaProjector::new(media.clone(), blobs));
    let readiness = ReadinessGate::new();

    let subscription = EventConsumer::new(Arc::clone(&connection))
        .with_readiness(readiness.clone())
        .subscribe(BINDING, projector)
        .await
        .with_context(|| format!("Failed to subscribe to {BINDING}"))?;
    readiness.mark_ready();

    let controller = Arc::new(AdmissionController::new(
        Arc::new(counter_store),
        config.admission.clone(),
    ));
    let router = build_router(
        AppState {
            service: Arc::new(MediaService::new(media)),
            readiness,
        },
        AdmissionLayer::new(controller),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Media service listening");

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
    let stats = subscription.stats();
    info!(
        binding = %subscription.binding(),
        delivered = stats.delivered,
        acked = stats.acked,
        requeued = stats.requeued,
        discarded = stats.discarded,
        "Subscription closed"
    );
    drop(subscription);
    if let Err(e) = connection.close().await {
        warn!(error = %e, "Broker connection did not close cleanly");
    }
    Ok(())
}
