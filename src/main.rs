//! Catalog Cache server binary
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load and validate configuration from environment variables
//! 3. Connect the shared store and the system of record (Redis and
//!    PostgreSQL, or in-process stand-ins when both are unset)
//! 4. Build the local cache, cache facade, lock and item service
//! 5. Serve the router until SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_cache::api::{create_router, AppState};
use catalog_cache::cache::ExpiringLruCache;
use catalog_cache::catalog::{connect_repository, CacheFacade, ItemService};
use catalog_cache::config::Config;
use catalog_cache::lock::{DistributedLock, LockSettings};
use catalog_cache::remote;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Catalog Cache Server");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        port = config.server_port,
        cache_capacity = config.cache.capacity,
        cache_ttl_secs = config.cache.ttl_secs,
        mode = if config.redis.url.is_some() { "shared" } else { "single-instance" },
        "Configuration loaded"
    );

    let remote = remote::connect(&config.redis)
        .await
        .context("failed to connect to the shared store")?;
    let repository = connect_repository(&config.database)
        .await
        .context("failed to connect to the database")?;

    let local = Arc::new(ExpiringLruCache::new(
        config.cache.capacity()?,
        config.cache.ttl(),
    ));
    let facade = CacheFacade::new(
        local,
        remote.clone(),
        config.redis.prefix.clone(),
        config.redis.expire_secs,
    );
    let service = ItemService::new(
        repository,
        facade,
        DistributedLock::new(remote),
        LockSettings::from(&config.lock),
    );

    let app = create_router(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
