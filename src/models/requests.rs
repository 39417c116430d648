//! Request DTOs for the control API
//!
//! Defines the structure of incoming control messages.

use serde::{Deserialize, Serialize};

/// Sentinel `type` that asks a waiting worker to activate now.
pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// Message posted to the worker (POST /__sw/message)
///
/// Messages without a `type`, or with an unknown one, are accepted and
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ControlMessage {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
        }
    }

    pub fn skip_waiting() -> Self {
        Self::new(SKIP_WAITING)
    }

    pub fn is_skip_waiting(&self) -> bool {
        self.kind.as_deref() == Some(SKIP_WAITING)
    }
}
