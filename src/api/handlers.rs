//! API Handlers
//!
//! The caching proxy itself plus the `/__sw/*` control endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    Json,
};
use bytes::Bytes;
use url::Url;

use crate::error::{Result, WorkerError};
use crate::fetch::{FetchRequest, FetchResponse};
use crate::models::{
    ControlMessage, GenerationStatus, HealthResponse, MessageResponse, StatusResponse,
    UpdateResponse,
};
use crate::registration::Registration;
use crate::worker::WorkerSettings;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<Registration>,
    /// Settings registered by POST /__sw/update
    pub settings: Arc<WorkerSettings>,
}

impl AppState {
    pub fn new(registration: Arc<Registration>, settings: WorkerSettings) -> Self {
        Self {
            registration,
            settings: Arc::new(settings),
        }
    }

    /// Rebuilds the page's request URL on the site origin.
    fn request_url(&self, uri: &Uri) -> Result<Url> {
        let origin = &self.settings.origin;
        if let Some(authority) = uri.authority() {
            let absolute = Url::parse(&uri.to_string())
                .map_err(|e| WorkerError::InvalidRequest(format!("bad request target: {}", e)))?;
            if absolute.origin() != origin.origin() {
                return Err(WorkerError::InvalidRequest(format!(
                    "cross-origin request for {} is not proxied",
                    authority
                )));
            }
            return Ok(absolute);
        }

        let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        origin
            .join(path)
            .map_err(|e| WorkerError::InvalidRequest(format!("bad request path: {}", e)))
    }
}

/// Fallback handler: every request that is not a control endpoint.
///
/// Intercepted requests go through the active worker's policies; anything
/// the worker does not intercept goes straight to the network.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<FetchResponse> {
    let request = FetchRequest {
        method,
        url: state.request_url(&uri)?,
        headers,
        body,
        cache_mode: Default::default(),
    };

    match state.registration.handle_fetch(&request).await {
        Some(result) => result,
        None => state.registration.network().fetch(&request).await,
    }
}

/// Handler for POST /__sw/message
pub async fn message_handler(
    State(state): State<AppState>,
    Json(message): Json<ControlMessage>,
) -> Result<Json<MessageResponse>> {
    let activation = state.registration.post_message(&message).await?;
    Ok(Json(MessageResponse::new(activation)))
}

/// Handler for POST /__sw/update
///
/// Registers the configured version again. A no-op while that version is
/// active; retries the install after a failure.
pub async fn update_handler(State(state): State<AppState>) -> Result<Json<UpdateResponse>> {
    let outcome = state
        .registration
        .register(state.settings.as_ref().clone())
        .await?;
    Ok(Json(UpdateResponse::from(outcome)))
}

/// Handler for GET /__sw/status
pub async fn status_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let registration = &state.registration;

    let active = match registration.active().await {
        Some(worker) => Some(worker.info().await),
        None => None,
    };
    let waiting = match registration.waiting().await {
        Some(worker) => Some(worker.info().await),
        None => None,
    };

    let mut generations = Vec::new();
    for name in registration.storage().keys().await? {
        // gone if an activation deleted it after the listing
        let Some(generation) = registration.storage().get(&name).await? else {
            continue;
        };
        let stats = generation.read().await.stats();
        generations.push(GenerationStatus::new(name, &stats));
    }

    Ok(Json(StatusResponse {
        active,
        waiting,
        update_available: registration.update_available().await,
        generations,
    }))
}

/// Handler for GET /__sw/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStorage;
    use crate::fetch::MemoryNetwork;
    use crate::manifest::AssetManifest;
    use crate::registry::CacheNaming;

    fn state() -> (AppState, Arc<MemoryNetwork>) {
        let origin = Url::parse("https://tingyuun.example").unwrap();
        let settings = WorkerSettings::new(
            origin.clone(),
            CacheNaming::default(),
            AssetManifest::new(vec!["/".into(), "/404.html".into()], vec![]),
        );
        let network = Arc::new(MemoryNetwork::new());
        network.serve_all(&origin, settings.manifest.entries());
        let registration = Arc::new(Registration::new(
            Arc::new(MemoryCacheStorage::new()),
            network.clone(),
        ));
        (AppState::new(registration, settings), network)
    }

    #[test]
    fn test_request_url_origin_form() {
        let (state, _) = state();
        let uri: Uri = "/gallery.html?page=2".parse().unwrap();
        assert_eq!(
            state.request_url(&uri).unwrap().as_str(),
            "https://tingyuun.example/gallery.html?page=2"
        );
    }

    #[test]
    fn test_request_url_rejects_foreign_absolute_form() {
        let (state, _) = state();
        let uri: Uri = "https://other.example/x.js".parse().unwrap();
        assert!(matches!(
            state.request_url(&uri),
            Err(WorkerError::InvalidRequest(_))
        ));

        let uri: Uri = "https://tingyuun.example/x.js".parse().unwrap();
        assert!(state.request_url(&uri).is_ok());
    }

    #[tokio::test]
    async fn test_update_then_status() {
        let (state, _) = state();

        let Json(update) = update_handler(State(state.clone())).await.unwrap();
        assert_eq!(update.outcome, "activated");

        let Json(status) = status_handler(State(state)).await.unwrap();
        let active = status.active.unwrap();
        assert_eq!(active.generation, "tingyuun-cache-v1.1.0");
        assert!(status.waiting.is_none());
        assert!(!status.update_available);
        assert_eq!(status.generations.len(), 1);
        assert_eq!(status.generations[0].entries, 2);
    }

    #[tokio::test]
    async fn test_message_without_waiting_worker() {
        let (state, _) = state();
        let Json(resp) = message_handler(State(state), Json(ControlMessage::skip_waiting()))
            .await
            .unwrap();
        assert!(!resp.activated);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
