//! Response DTOs for the control API
//!
//! Defines the structure of outgoing JSON bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::lifecycle::{ActivationReport, InstallReport};
use crate::registration::RegisterOutcome;
use crate::worker::WorkerInfo;

/// One cache generation in the status report.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStatus {
    pub name: String,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub hit_rate: f64,
}

impl GenerationStatus {
    pub fn new(name: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            name: name.into(),
            entries: stats.total_entries,
            hits: stats.hits,
            misses: stats.misses,
            stores: stats.stores,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for GET /__sw/status
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub active: Option<WorkerInfo>,
    pub waiting: Option<WorkerInfo>,
    /// A newer version is installed but not yet in control
    pub update_available: bool,
    pub generations: Vec<GenerationStatus>,
}

/// Response body for POST /__sw/message
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Whether the message caused a waiting worker to activate
    pub activated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationReport>,
}

impl MessageResponse {
    pub fn new(activation: Option<ActivationReport>) -> Self {
        Self {
            activated: activation.is_some(),
            activation,
        }
    }
}

/// Response body for POST /__sw/update
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    /// `unchanged`, `activated` or `waiting`
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationReport>,
}

impl From<RegisterOutcome> for UpdateResponse {
    fn from(outcome: RegisterOutcome) -> Self {
        match outcome {
            RegisterOutcome::Unchanged => Self {
                outcome: "unchanged",
                install: None,
                activation: None,
            },
            RegisterOutcome::Activated {
                install,
                activation,
            } => Self {
                outcome: "activated",
                install: Some(install),
                activation: Some(activation),
            },
            RegisterOutcome::Waiting(install) => Self {
                outcome: "waiting",
                install: Some(install),
                activation: None,
            },
        }
    }
}

/// Response body for the health endpoint (GET /__sw/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
