//! Strata-Memory - tiered conversational context server
//!
//! Standalone context store with a REST API for classifier/prompt layers

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use strata_memory::config::ServerConfig;
use strata_memory::constants::SHUTDOWN_FLUSH_TIMEOUT_SECS;
use strata_memory::handlers::{build_router, ContextService};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🧠 Starting Strata-Memory server...");

    // Load and validate configuration from environment
    let config = ServerConfig::from_env();
    if let Err(e) = config.validate() {
        anyhow::bail!("invalid configuration: {e}");
    }
    config.log();

    // Build the service and restore durable sessions
    let service = Arc::new(ContextService::new(&config)?);
    let restored = service.load_persisted();
    info!("📂 Restored {restored} session(s) from {:?}", config.storage_path);

    // Keep a reference for shutdown cleanup (clone BEFORE moving into router)
    let service_for_shutdown = Arc::clone(&service);

    let app = build_router(service)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("🚀 Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🔒 Shutdown signal received, flushing sessions...");

    // Bound the final flush so a stuck disk cannot hang shutdown
    let flush_future = async { service_for_shutdown.flush_all() };
    match tokio::time::timeout(
        Duration::from_secs(SHUTDOWN_FLUSH_TIMEOUT_SECS),
        flush_future,
    )
    .await
    {
        Ok(flushed) => info!("✅ Flushed {flushed} session(s)"),
        Err(_) => tracing::error!(
            "⏱️  Session flush timed out after {}s",
            SHUTDOWN_FLUSH_TIMEOUT_SECS
        ),
    }

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received, starting graceful shutdown");
}
