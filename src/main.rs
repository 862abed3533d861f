//! Peercache - A distributed in-memory byte cache
//!
//! Runs one cache node: a loader-backed group routed over the peer ring,
//! plus on-demand groups seeded through the HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peercache::api::{create_router, AppState};
use peercache::config::Config;
use peercache::group::{FileLoader, Group, GroupRegistry};
use peercache::peers::HttpPool;
use peercache::tasks::spawn_stats_task;

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the peer ring and the configured group
/// 4. Start background stats reporter
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Peercache node");

    let config = Config::from_env();
    info!(
        "Configuration loaded: node={}, peers={:?}, group={}, cache_bytes={}, replicas={}, port={}",
        config.self_addr,
        config.peers,
        config.group_name,
        config.cache_bytes,
        config.replicas,
        config.server_port
    );

    // Peer ring, including this node
    let pool = Arc::new(HttpPool::new(
        config.self_addr.clone(),
        config.base_path.clone(),
        config.replicas,
    ));
    pool.set_peers(&config.peers);

    // Groups
    let registry = Arc::new(GroupRegistry::new(config.cache_bytes));
    let mut builder = Group::builder(config.group_name.clone())
        .capacity(config.cache_bytes)
        .loader(FileLoader::new(&config.data_dir))
        .peers(pool.clone());
    if let Some(timeout) = config.load_timeout() {
        builder = builder.load_timeout(timeout);
    }
    registry
        .register(builder.build()?)
        .context("registering configured group")?;
    info!(data_dir = %config.data_dir, "Group {} ready", config.group_name);

    let state = AppState::new(registry.clone()).with_pool(pool);

    let stats_handle = spawn_stats_task(registry, config.stats_interval);
    info!("Background stats reporter started");

    let app = create_router(state, &config.base_path);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}{}", addr, config.base_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(stats_handle))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the stats task and allows graceful shutdown.
async fn shutdown_signal(stats_handle: tokio::task::JoinHandle<()>) {
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

    stats_handle.abort();
    warn!("Stats reporter aborted");
}
