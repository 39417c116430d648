//! Request and Response models for the control API
//!
//! DTOs serialized to and from the `/__sw/*` endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ControlMessage, SKIP_WAITING};
pub use responses::{
    ErrorResponse, GenerationStatus, HealthResponse, MessageResponse, StatusResponse,
    UpdateResponse,
};
