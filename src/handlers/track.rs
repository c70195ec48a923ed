//! Tracking endpoints
//!
//! Thin plumbing over the core: parse the address, hand off to the watch
//! registry or the holder ranker. The token endpoint responds with the
//! ranked list immediately; holder registration continues in the background
//! with the log as its only error channel.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::holders::{rank_holders, HolderEntry};
use crate::ledger::LedgerClient;
use crate::watch::{watch_holders, WatchRegistry, WatchedAccount};

/// State shared by the tracking handlers
pub struct TrackState {
    /// Ledger client, for the holder ranking queries
    pub ledger: Arc<dyn LedgerClient>,
    /// Watch registry
    pub registry: Arc<WatchRegistry>,
    /// Delay between holder registrations
    pub registration_delay: Duration,
}

/// Acknowledgment body for wallet tracking
#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub status: &'static str,
    pub address: String,
}

/// Start watching a single account
///
/// GET /api/track/wallet/{address}
pub async fn track_wallet(
    State(state): State<Arc<TrackState>>,
    Path(address): Path<String>,
) -> Result<(StatusCode, Json<TrackResponse>), AppError> {
    let pubkey = parse_address(&address)?;
    state.registry.watch(&pubkey, None).await?;

    Ok((
        StatusCode::OK,
        Json(TrackResponse {
            status: "watching",
            address,
        }),
    ))
}

/// Stop watching a single account
///
/// DELETE /api/track/wallet/{address}
pub async fn untrack_wallet(
    State(state): State<Arc<TrackState>>,
    Path(address): Path<String>,
) -> Result<Json<TrackResponse>, AppError> {
    let pubkey = parse_address(&address)?;

    if state.registry.unwatch(&pubkey).await {
        Ok(Json(TrackResponse {
            status: "stopped",
            address,
        }))
    } else {
        Err(AppError::NotFound(format!(
            "account is not being watched: {address}"
        )))
    }
}

/// Rank a token's largest holders and start watching them
///
/// GET /api/track/token/{mint}
///
/// An empty array means the ranking was unavailable, not that the token has
/// zero holders.
pub async fn track_token(
    State(state): State<Arc<TrackState>>,
    Path(mint): Path<String>,
) -> Result<Json<Vec<HolderEntry>>, AppError> {
    let mint_key = parse_address(&mint)?;

    let holders = match rank_holders(state.ledger.as_ref(), &mint_key).await {
        Ok(holders) => holders,
        Err(e) => {
            tracing::warn!(mint = %mint, error = %e, "Holder ranking unavailable");
            Vec::new()
        }
    };

    if !holders.is_empty() {
        tokio::spawn(watch_holders(
            state.registry.clone(),
            holders.clone(),
            state.registration_delay,
        ));
    }

    Ok(Json(holders))
}

/// List the accounts currently being watched
///
/// GET /api/track
pub async fn list_watched(State(state): State<Arc<TrackState>>) -> Json<Vec<WatchedAccount>> {
    Json(state.registry.watched().await)
}

fn parse_address(address: &str) -> Result<Pubkey, AppError> {
    address
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid base-58 address: {address}")))
}
