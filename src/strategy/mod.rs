//! Policy Executors
//!
//! The three caching algorithms plus network-only passthrough. Each call
//! resolves one request against the worker's generation and the network.

mod cache_first;
mod network_first;
mod stale_while_revalidate;

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::cache::{CacheStorage, GenerationHandle, RequestKey};
use crate::error::Result;
use crate::fetch::{FetchRequest, FetchResponse, Network};
use crate::router::Policy;

/// Runs policies against one generation.
#[derive(Clone)]
pub struct PolicyExecutor {
    network: Arc<dyn Network>,
    storage: Arc<dyn CacheStorage>,
    generation: String,
    offline_fallback: Url,
}

impl PolicyExecutor {
    /// `generation` is the only generation this executor reads or writes.
    /// `offline_fallback` is the absolute URL of the offline error page.
    pub fn new(
        network: Arc<dyn Network>,
        storage: Arc<dyn CacheStorage>,
        generation: impl Into<String>,
        offline_fallback: Url,
    ) -> Self {
        Self {
            network,
            storage,
            generation: generation.into(),
            offline_fallback,
        }
    }

    pub fn generation_name(&self) -> &str {
        &self.generation
    }

    /// The generation is created at install. Once activation of a newer
    /// version has deleted it, requests still in flight here go to the
    /// network uncached rather than recreating it.
    async fn generation(&self) -> Result<Option<GenerationHandle>> {
        let generation = self.storage.get(&self.generation).await?;
        if generation.is_none() {
            debug!("{} no longer exists, not caching", self.generation);
        }
        Ok(generation)
    }

    pub async fn execute(&self, policy: Policy, request: &FetchRequest) -> Result<FetchResponse> {
        debug!("{} {} via {}", request.method, request.url, policy);
        match policy {
            Policy::CacheFirst => self.cache_first(request).await,
            Policy::NetworkFirst => self.network_first(request).await,
            Policy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Policy::NetworkOnly => self.network.fetch(request).await,
        }
    }
}

/// Stores a copy of `response` if it is ok and the request is cacheable.
/// Storage failures are logged, never returned: the caller already has
/// a response to serve.
pub(crate) async fn store_if_ok(
    generation: &GenerationHandle,
    key: RequestKey,
    response: &FetchResponse,
) {
    if !response.ok() || !key.is_storable() {
        return;
    }
    let mut guard = generation.write().await;
    if let Err(e) = guard.put(key, response.clone()) {
        warn!("failed to store response in {}: {}", guard.name(), e);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::cache::MemoryCacheStorage;
    use crate::fetch::MemoryNetwork;

    pub const ORIGIN: &str = "https://tingyuun.example";
    pub const GENERATION: &str = "tingyuun-cache-v1.1.0";

    pub fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    pub fn get(path: &str) -> FetchRequest {
        FetchRequest::get(url(path))
    }

    pub struct Fixture {
        pub network: Arc<MemoryNetwork>,
        pub storage: Arc<MemoryCacheStorage>,
        pub executor: PolicyExecutor,
    }

    impl Fixture {
        pub async fn new() -> Self {
            let network = Arc::new(MemoryNetwork::new());
            let storage = Arc::new(MemoryCacheStorage::new());
            storage.open(GENERATION).await.unwrap();
            let executor = PolicyExecutor::new(
                network.clone(),
                storage.clone(),
                GENERATION,
                url("/404.html"),
            );
            Self {
                network,
                storage,
                executor,
            }
        }

        pub async fn cached_body(&self, path: &str) -> Option<bytes::Bytes> {
            let generation = self.storage.get(GENERATION).await.unwrap()?;
            let guard = generation.read().await;
            guard
                .peek(&RequestKey::get(&url(path)))
                .map(|response| response.body.clone())
        }

        pub async fn seed(&self, path: &str, body: &'static str) {
            let generation = self.storage.open(GENERATION).await.unwrap();
            generation
                .write()
                .await
                .put(
                    RequestKey::get(&url(path)),
                    FetchResponse::new(axum::http::StatusCode::OK, body),
                )
                .unwrap();
        }
    }
}
