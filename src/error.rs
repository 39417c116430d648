//! Error types for the caching worker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Asset Failure ==
/// A single manifest entry that could not be pre-cached during install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    /// Manifest path of the asset
    pub path: String,
    /// Why the fetch was rejected (network error or non-ok status)
    pub reason: String,
}

impl std::fmt::Display for AssetFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

// == Worker Error Enum ==
/// Unified error type for the caching worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Network-level failure (offline, DNS, connection reset, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// One or more manifest assets could not be fetched during install
    #[error("Install of {generation} failed: {} asset(s) unavailable", .failures.len())]
    InstallFailed {
        generation: String,
        failures: Vec<AssetFailure>,
    },

    /// Cache storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Lifecycle operation attempted from the wrong state
    #[error("Invalid state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid settings (version tag, manifest, origin)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// True for failures that mean "the network could not be reached",
    /// as opposed to an HTTP error status, which is a successful fetch.
    pub fn is_network(&self) -> bool {
        matches!(self, WorkerError::Network(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkerError::Network(_) => StatusCode::BAD_GATEWAY,
            WorkerError::InstallFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            WorkerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            WorkerError::InvalidState { .. } => StatusCode::CONFLICT,
            WorkerError::Storage(_) | WorkerError::Config(_) | WorkerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching worker.
pub type Result<T> = std::result::Result<T, WorkerError>;
