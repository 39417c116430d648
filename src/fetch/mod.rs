//! Fetch Module
//!
//! Request/response types that flow between pages, the cache and the
//! network, plus the [`Network`] abstraction the policies fetch through.

mod client;
mod memory;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use url::Url;

use crate::error::Result;

pub use client::HttpNetwork;
pub use memory::MemoryNetwork;

// == Cache Mode ==
/// How the request should treat intermediate HTTP caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Normal fetch semantics
    #[default]
    Default,
    /// Force a fresh fetch from the origin, bypassing HTTP caches
    Reload,
}

// == Fetch Request ==
/// An intercepted request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub cache_mode: CacheMode,
}

impl FetchRequest {
    /// Creates a GET request with no headers or body.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            cache_mode: CacheMode::Default,
        }
    }

    /// Sets the cache mode.
    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    /// URL path used for classification.
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

// == Fetch Response ==
/// A response from the network or from a cache generation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header, ignoring values that are not valid header text.
    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// True for 2xx statuses; only these are ever stored.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for FetchResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        for (name, value) in self.headers.iter() {
            // hop-by-hop and framing headers are recomputed by the server
            if name == header::CONNECTION
                || name == header::TRANSFER_ENCODING
                || name == header::CONTENT_LENGTH
            {
                continue;
            }
            response.headers_mut().append(name.clone(), value.clone());
        }
        response
    }
}

// == Network ==
/// Abstraction over the network so policies can be exercised offline.
///
/// An `Err` means the network could not be reached. HTTP error statuses
/// are successful fetches and come back as `Ok`.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}
