//! Argus - swap activity watcher for Solana accounts
//!
//! This is the main entry point for the service.
//! It sets up the Axum web server with middleware and routes.

mod config;
mod error;
mod handlers;
mod holders;
mod ledger;
mod watch;

use axum::{routing::get, Router};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::handlers::{
    health_check, health_simple, list_watched, track_token, track_wallet, untrack_wallet,
    AppState, TrackState,
};
use crate::ledger::{LedgerClient, RpcLedger};
use crate::watch::WatchRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    tracing::info!("Starting Argus v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    // Construct the shared ledger client once and inject it everywhere
    let ledger: Arc<dyn LedgerClient> = Arc::new(RpcLedger::new(&config.rpc));
    tracing::info!(
        http_url = %config.rpc.http_url,
        ws_url = %config.rpc.ws_url,
        "Ledger client initialized"
    );

    // Watch registry owns every active monitor
    let registry = Arc::new(WatchRegistry::new(ledger.clone(), &config.watch));
    tracing::info!("Watch registry initialized");

    // Create shared state
    let track_state = Arc::new(TrackState {
        ledger,
        registry: registry.clone(),
        registration_delay: Duration::from_millis(config.watch.registration_delay_ms),
    });

    let app_state = Arc::new(AppState {
        registry,
        started_at: Utc::now(),
    });

    // Tracking routes
    let track_routes = Router::new()
        .route("/track", get(list_watched))
        .route(
            "/track/wallet/{address}",
            get(track_wallet).delete(untrack_wallet),
        )
        .route("/track/token/{mint}", get(track_token))
        .with_state(track_state);

    // Health routes
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .with_state(app_state);

    // Simple health check for load balancers
    let root_routes = Router::new().route("/health", get(health_simple));

    // Combine all routes under /api
    let api_routes = Router::new().merge(track_routes).merge(health_routes);

    // Build final router
    let app = Router::new()
        .nest("/api", api_routes)
        .merge(root_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("Invalid server address");

    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "argus=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Load and validate configuration
fn load_config() -> anyhow::Result<AppConfig> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}
