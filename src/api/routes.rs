//! API Routes
//!
//! Configures the Axum router: control endpoints plus the proxy fallback.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, message_handler, proxy_handler, status_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /__sw/message` - Deliver a control message (`SKIP_WAITING`)
/// - `POST /__sw/update` - Install/activate the configured version
/// - `GET /__sw/status` - Worker versions and cache generations
/// - `GET /__sw/health` - Health check endpoint
/// - anything else - Proxied through the active worker
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__sw/message", post(message_handler))
        .route("/__sw/update", post(update_handler))
        .route("/__sw/status", get(status_handler))
        .route("/__sw/health", get(health_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
