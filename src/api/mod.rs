//! API Module
//!
//! The caching proxy surface and its control endpoints.
//!
//! # Endpoints
//! - `POST /__sw/message` - Deliver a control message
//! - `POST /__sw/update` - Install/activate the configured version
//! - `GET /__sw/status` - Worker versions and cache generations
//! - `GET /__sw/health` - Health check endpoint
//! - everything else - Proxied through the active worker

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
