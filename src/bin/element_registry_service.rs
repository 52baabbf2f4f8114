//! Element Registry Service Binary
//!
//! Runs the element registry as a REST API service, with an in-process
//! keeper sweeping the registry on a fixed interval:
//! - Structured JSON logging
//! - Request tracing with correlation IDs
//! - Graceful shutdown of both the server and the keeper
//!
//! ## Configuration
//!
//! Environment variables:
//! - `REGISTRY_TARGET_SIZE`, `REGISTRY_BATCH_LIMIT`, `REGISTRY_RANGE`,
//!   `REGISTRY_REPLENISH`: registry parameters (default: 100 / 10 / 20 / restore_target)
//! - `PREDICATE_SEED`: seed of the hash oracle (default: 0)
//! - `PREDICATE_PROBABILITY`: share of elements closable per generation (default: 0.05)
//! - `PREDICATE_EPOCH_MS`: how often the oracle re-rolls (default: 10000)
//! - `KEEPER_INTERVAL_MS`, `KEEPER_SCAN_COUNT`: keeper cadence (default: 1000 / 100)
//! - `MAX_PERFORM_IDS`: ids accepted by one perform request (default: 1000)
//! - `PORT`: Service port (default: 8002)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! REGISTRY_TARGET_SIZE=1000 cargo run --bin element_registry_service --features service
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use element_registry::keeper::{Keeper, KeeperConfig};
use element_registry::policy::env_or;
use element_registry::service::{create_router, metrics_middleware, ServiceState};
use element_registry::{ElementRegistry, HashPredicate, RegistryConfig, SharedRegistry};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "element_registry_service=info,element_registry=info,tower_http=info".into()
    });

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

/// Request logging middleware that adds correlation ID and timing
async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let trace_id = request
        .headers()
        .get("X-Request-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        trace_id = %trace_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "element_registry_service::access",
        trace_id = %trace_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");

    info!(
        version = version,
        build_sha = build_sha,
        "Starting Element Registry Service"
    );

    let port: u16 = env_or("PORT", 8002)?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    let config = RegistryConfig::from_env()?;
    let predicate = Arc::new(HashPredicate::new(
        env_or("PREDICATE_SEED", 0u64)?,
        env_or("PREDICATE_PROBABILITY", 0.05f64)?,
    )?);
    let epoch = Duration::from_millis(env_or("PREDICATE_EPOCH_MS", 10_000u64)?.max(1));

    let registry: SharedRegistry<HashPredicate> =
        ElementRegistry::with_shared_predicate(config, predicate.clone())?.into();
    let snapshot = registry.snapshot();
    info!(
        length = snapshot.length,
        params_hash = %snapshot.params_hash,
        snapshot_id = %snapshot.snapshot_id,
        "Registry initialized"
    );

    let state = ServiceState::from_env(registry.clone())?;
    let keeper_config = KeeperConfig::from_env()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Keeper
    let mut keeper = Keeper::new(registry, keeper_config);
    let mut keeper_rx = shutdown_rx.clone();
    let keeper_task = tokio::spawn(async move {
        keeper
            .run(async move {
                let _ = keeper_rx.changed().await;
            })
            .await;
    });

    // Oracle epochs
    let mut epoch_rx = shutdown_rx;
    let epoch_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(epoch);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = epoch_rx.changed() => break,
                _ = ticker.tick() => {
                    let generation = predicate.advance();
                    tracing::debug!(generation, "oracle advanced");
                }
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(
        address = %addr,
        version = version,
        "Element Registry Service listening"
    );

    let listener = TcpListener::bind(addr).await?;

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    keeper_task.await?;
    epoch_task.await?;

    info!("Element Registry Service shutdown complete");

    Ok(())
}
