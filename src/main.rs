//! History Cache - local history service
//!
//! Serves the reconciled history view to a local UI, backed by the remote
//! history backend and a per-user in-memory cache.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use history_cache::api::create_router;
use history_cache::cache::{shared, CacheStore};
use history_cache::{spawn_purge_task, AppState, Config, HistoryCoordinator};

/// Main entry point for the history service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache store and the coordinator
/// 4. Start background purge task and the auto-fetch
/// 5. Serve the HTTP API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "history_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting history cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: endpoint={}, user={:?}, auto_fetch={}, max_age={}ms, port={}, purge_interval={}s",
        config.endpoint,
        config.user_id,
        config.auto_fetch,
        config.cache_max_age_ms,
        config.server_port,
        config.purge_interval
    );

    let cache = shared(CacheStore::new());
    let coordinator = HistoryCoordinator::connect(config.coordinator(), cache.clone())
        .context("Failed to build history backend client")?
        .with_max_age(config.cache_max_age_ms);

    let purge_handle = spawn_purge_task(
        cache,
        config.cache_max_age_ms,
        Duration::from_secs(config.purge_interval),
    );
    info!("Background purge task started");

    if coordinator.activate().await.is_some() {
        info!("Initial history fetch started");
    }

    let state = AppState::new(coordinator).with_max_age(config.cache_max_age_ms);
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(purge_handle))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the purge task.
async fn shutdown_signal(purge_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
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

    purge_handle.abort();
    warn!("Purge task aborted");
}
