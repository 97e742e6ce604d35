//! Caching Proxy - a caching HTTP reverse proxy
//!
//! Forwards requests to a single origin and serves repeats from an LRU
//! cache with optional snapshot persistence.

mod cache;
mod config;
mod error;
mod proxy;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use proxy::{create_router, AppState};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the cache store (hydrating any snapshot) and the forwarder
/// 4. Handle the clear-and-exit flag
/// 5. Start the HTTP server on the configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting caching proxy");

    // Bad settings are fatal before the server comes up.
    let config = Config::from_env().context("invalid configuration")?;
    info!(
        port = config.server_port,
        origin = %config.origin,
        capacity = ?config.capacity,
        snapshot = ?config.snapshot_path,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config).context("failed to initialize proxy state")?;

    if config.clear_cache {
        state.cache.write().await.clear();
        info!("Cache cleared");
        return Ok(());
    }

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        "Proxy listening on http://{}, forwarding misses to {}",
        addr, config.origin
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let stats = state.cache.read().await.stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        stored = stats.stored,
        entries = stats.entries,
        hit_rate = stats.hit_rate(),
        "Server shutdown complete"
    );
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
