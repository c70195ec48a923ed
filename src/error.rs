//! Error types for Argus

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::watch::WatchError;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Address already has an active monitor
    #[error("Already watching: {0}")]
    AlreadyWatched(String),

    /// RPC/ledger error
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<WatchError> for AppError {
    fn from(err: WatchError) -> Self {
        match err {
            WatchError::AlreadyWatched(address) => AppError::AlreadyWatched(address),
            WatchError::Subscription(e) => AppError::Ledger(e.to_string()),
        }
    }
}

/// Error response structure for API
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_response) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    status: "rejected",
                    reason: "validation_failed".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    status: "rejected",
                    reason: "not_found".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::AlreadyWatched(address) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    status: "rejected",
                    reason: "already_watching".to_string(),
                    details: Some(format!("Account is already being watched: {}", address)),
                },
            ),
            AppError::Ledger(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    status: "error",
                    reason: "rpc_error".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    status: "error",
                    reason: "internal_error".to_string(),
                    details: Some(msg.clone()),
                },
            ),
        };

        // Log the error
        tracing::error!(
            error_type = %self,
            status_code = %status_code,
            "Request error"
        );

        (status_code, Json(json!(error_response))).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
