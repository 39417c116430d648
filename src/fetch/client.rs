//! HTTP Network
//!
//! Forwards requests for the site's origin to the upstream server with reqwest.

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{CacheMode, FetchRequest, FetchResponse, Network};
use crate::error::{Result, WorkerError};

/// Network backed by a reqwest client.
///
/// Requests addressed to `origin` are rewritten to `upstream`: the site path
/// is appended to the upstream's base path and the query is kept. Anything
/// else is fetched as-is.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
    upstream: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url, upstream: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tingyuun-worker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WorkerError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            origin,
            upstream,
        })
    }

    /// Maps a site URL onto the upstream server.
    pub fn upstream_url(&self, url: &Url) -> Url {
        if url.origin() != self.origin.origin() {
            return url.clone();
        }
        let mut target = self.upstream.clone();
        let base = self.upstream.path().trim_end_matches('/');
        target.set_path(&format!("{}{}", base, url.path()));
        target.set_query(url.query());
        target
    }

    fn outgoing_headers(request: &FetchRequest) -> HeaderMap {
        let mut headers = request.headers.clone();
        headers.remove(header::HOST);
        headers.remove(header::CONNECTION);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);

        if request.cache_mode == CacheMode::Reload {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
            headers.remove(header::IF_NONE_MATCH);
            headers.remove(header::IF_MODIFIED_SINCE);
        }
        headers
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let target = self.upstream_url(&request.url);

        let response = self
            .client
            .request(request.method.clone(), target.as_str())
            .headers(Self::outgoing_headers(request))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| WorkerError::Network(format!("{} {}: {}", request.method, target, e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| WorkerError::Network(format!("failed to read {}: {}", target, e)))?;

        debug!("fetched {} -> {} ({} bytes)", request.url, status, body.len());

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> HttpNetwork {
        HttpNetwork::new(
            Url::parse("https://tingyuun.example").unwrap(),
            Url::parse("http://127.0.0.1:8080").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_upstream_url_rewrites_site_origin() {
        let net = network();
        let url = Url::parse("https://tingyuun.example/gallery.html?page=2").unwrap();
        assert_eq!(
            net.upstream_url(&url).as_str(),
            "http://127.0.0.1:8080/gallery.html?page=2"
        );
    }

    #[test]
    fn test_upstream_url_keeps_upstream_base_path() {
        for upstream in ["http://127.0.0.1:8080/site", "http://127.0.0.1:8080/site/"] {
            let net = HttpNetwork::new(
                Url::parse("https://tingyuun.example").unwrap(),
                Url::parse(upstream).unwrap(),
            )
            .unwrap();

            let url = Url::parse("https://tingyuun.example/css/style.css?v=2").unwrap();
            assert_eq!(
                net.upstream_url(&url).as_str(),
                "http://127.0.0.1:8080/site/css/style.css?v=2"
            );

            let root = Url::parse("https://tingyuun.example/").unwrap();
            assert_eq!(net.upstream_url(&root).as_str(), "http://127.0.0.1:8080/site/");
        }
    }

    #[test]
    fn test_upstream_url_leaves_foreign_origin() {
        let net = network();
        let url = Url::parse("https://other.example/x.js").unwrap();
        assert_eq!(net.upstream_url(&url), url);
    }

    #[test]
    fn test_reload_headers_bypass_http_cache() {
        let mut req = FetchRequest::get(Url::parse("https://tingyuun.example/").unwrap())
            .with_cache_mode(CacheMode::Reload);
        req.headers
            .insert(header::HOST, HeaderValue::from_static("tingyuun.example"));
        req.headers
            .insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"abc\""));

        let headers = HttpNetwork::outgoing_headers(&req);
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::PRAGMA], "no-cache");
        assert!(headers.get(header::HOST).is_none());
        assert!(headers.get(header::IF_NONE_MATCH).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        // port 9 (discard) is not expected to accept HTTP
        let net = HttpNetwork::new(
            Url::parse("https://tingyuun.example").unwrap(),
            Url::parse("http://127.0.0.1:9").unwrap(),
        )
        .unwrap();
        let req = FetchRequest::get(Url::parse("https://tingyuun.example/index.html").unwrap());

        let result = net.fetch(&req).await;
        assert!(matches!(result, Err(WorkerError::Network(_))));
    }
}
