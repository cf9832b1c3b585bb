//! Quip Server - REST API for weighted multi-hash image similarity
//!
//! Exposes quip-core functionality via HTTP endpoints:
//! - POST /observations - Store a judged image
//! - POST /check - Estimate AI likelihood from nearest neighbours
//! - POST /feedback - Report whether a prediction was correct
//! - GET /weights - Current per-hash-type trust weights

use std::net::SocketAddr;
use std::time::Duration;

use quip_server::{create_router_with_state, AppState, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// How often expired exact-match cache entries are pruned
const CACHE_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quip_server=info,quip_core=info,tower_http=info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::from_env();
    let state = AppState::from_config(&config)?;

    tracing::info!(
        hash_types = ?config.engine.hash_types,
        top_k = config.engine.top_k,
        likely_threshold = config.engine.likely_threshold,
        cache_max_entries = config.cache_max_entries,
        cache_ttl_secs = config.cache_ttl_secs,
        "Quip server v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let cache = state.cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = cache.prune_expired();
            if removed > 0 {
                tracing::info!(removed, "Pruned expired exact cache entries");
            }
        }
    });

    let app = create_router_with_state(&config, state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API docs at http://{}/docs", addr);

    // Peer addresses are needed by the rate limiter's IP key extractor
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
