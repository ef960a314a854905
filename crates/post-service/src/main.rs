//! # Post Service Binary
//!
//! ## Startup Sequence
//!
//! 1. Install logging
//! 2. Load and validate configuration
//! 3. Connect the shared cache and counter store
//! 4. Connect to the broker (backoff at boot only)
//! 5. Serve HTTP until Ctrl+C
//!
//! Any failure before step 5 exits non-zero.

use std::net::SocketAddr;
use std::sync::Arc;

use admission_control::{AdmissionController, AdmissionLayer, RedisCounterStore};
use anyhow::{Context, Result};
use post_service::{build_router, AppState, InMemoryPostRepository, PostService, ServiceConfig};
use service_telemetry::{init_telemetry, TelemetryConfig};
use shared_bus::{BrokerConfig, BrokerConnection, BrokerPublisher, ReadinessGate, Transport};
use shared_cache::{CacheAside, CacheKeys, RedisCacheStore};
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
    let _telemetry = init_telemetry(TelemetryConfig::from_env("post-service"))
        .context("Failed to initialize telemetry")?;

    let config = ServiceConfig::from_env();
    config.validate().context("Invalid configuration")?;

    let cache_store = RedisCacheStore::connect(&config.redis_url)
        .await
        .context("Failed to connect to cache store")?;
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

    let service = Arc::new(PostService::new(
        Arc::new(InMemoryPostRepository::new()),
        CacheAside::new(Arc::new(cache_store), CacheKeys::posts(), config.cache.clone()),
        Arc::new(BrokerPublisher::new(Arc::clone(&connection))),
    ));
    let controller = Arc::new(AdmissionController::new(
        Arc::new(counter_store),
        config.admission.clone(),
    ));

    // The post service consumes nothing, so it is ready once connected.
    let readiness = ReadinessGate::new();
    readiness.mark_ready();

    let router = build_router(
        AppState {
            service,
            readiness,
        },
        AdmissionLayer::new(controller),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Post service listening");

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
    if let Err(e) = connection.close().await {
        warn!(error = %e, "Broker connection did not close cleanly");
    }
    Ok(())
}
