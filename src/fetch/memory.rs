//! In-memory origin
//!
//! A [`Network`] that serves a fixed set of responses. Used to drive the
//! worker without a real upstream: it counts calls, can be switched offline
//! and can be slowed down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use url::Url;

use super::{FetchRequest, FetchResponse, Network};
use crate::error::{Result, WorkerError};

#[derive(Debug, Default)]
pub struct MemoryNetwork {
    routes: Mutex<HashMap<String, FetchResponse>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` with status 200 for `url`.
    pub fn serve(&self, url: &str, body: impl Into<Bytes>) {
        self.serve_response(url, FetchResponse::new(StatusCode::OK, body));
    }

    /// Serves an arbitrary response for `url`, replacing any previous one.
    pub fn serve_response(&self, url: &str, response: FetchResponse) {
        let key = normalize(url);
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, response);
    }

    /// Serves `body` for every path, resolved against `origin`.
    pub fn serve_all<'a>(&self, origin: &Url, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            if let Ok(url) = origin.join(path) {
                self.serve(url.as_str(), format!("body of {}", path));
            }
        }
    }

    /// Removes the route for `url`; later fetches get a 404.
    pub fn remove(&self, url: &str) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&normalize(url));
    }

    /// When offline every fetch fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delays every fetch by `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// Total number of fetches attempted.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of fetches attempted for `url`.
    pub fn calls_for(&self, url: &str) -> usize {
        let key = normalize(url);
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| **c == key)
            .count()
    }
}

fn normalize(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

#[async_trait]
impl Network for MemoryNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let key = normalize(request.url.as_str());
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.clone());

        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(WorkerError::Network(format!("offline: {}", key)));
        }

        let found = self
            .routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned();
        Ok(found.unwrap_or_else(|| FetchResponse::new(StatusCode::NOT_FOUND, "not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_serves_registered_routes() {
        let net = MemoryNetwork::new();
        net.serve("http://localhost:3000/index.html", "home");

        let resp = net.fetch(&get("http://localhost:3000/index.html")).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, Bytes::from("home"));

        let resp = net.fetch(&get("http://localhost:3000/missing.html")).await.unwrap();
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(net.call_count(), 2);
    }

    #[tokio::test]
    async fn test_offline_fails_but_counts_call() {
        let net = MemoryNetwork::new();
        net.serve("http://localhost:3000/", "home");
        net.set_offline(true);

        let result = net.fetch(&get("http://localhost:3000/")).await;
        assert!(matches!(result, Err(WorkerError::Network(_))));
        assert_eq!(net.calls_for("http://localhost:3000/"), 1);
    }
}
