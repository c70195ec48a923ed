//! Health check endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::watch::WatchRegistry;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall system status
    pub status: &'static str,
    /// Uptime in seconds
    pub uptime_seconds: i64,
    /// Number of accounts currently being watched
    pub watched_accounts: usize,
}

/// Shared application state for health checks
pub struct AppState {
    /// Watch registry, for the active-monitor count
    pub registry: Arc<WatchRegistry>,
    /// Application start time
    pub started_at: chrono::DateTime<Utc>,
}

/// Health check handler
///
/// GET /api/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = (Utc::now() - state.started_at).num_seconds();

    let response = HealthResponse {
        status: "healthy",
        uptime_seconds: uptime,
        watched_accounts: state.registry.watched_count().await,
    };

    (StatusCode::OK, Json(response))
}

/// Simple health check (for load balancers)
///
/// GET /health
pub async fn health_simple() -> StatusCode {
    StatusCode::OK
}
