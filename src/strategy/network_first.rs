//! Network-first: keep pages fresh, fall back to the cache when offline.

use tracing::{debug, warn};

use super::{store_if_ok, PolicyExecutor};
use crate::cache::RequestKey;
use crate::error::Result;
use crate::fetch::{FetchRequest, FetchResponse};
use crate::router::is_html_page;

impl PolicyExecutor {
    /// Only network failures trigger the fallback chain: cached copy, then
    /// the offline page for HTML requests, then the original error. HTTP
    /// error statuses are returned as they are.
    pub async fn network_first(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let Some(generation) = self.generation().await? else {
            return self.network.fetch(request).await;
        };
        let key = RequestKey::from_request(request);

        let err = match self.network.fetch(request).await {
            Ok(response) => {
                store_if_ok(&generation, key, &response).await;
                return Ok(response);
            }
            Err(err) if err.is_network() => err,
            Err(err) => return Err(err),
        };

        warn!("network-first fetch failed for {}: {}", key, err);
        let mut guard = generation.write().await;

        if let Some(cached) = guard.match_request(&key) {
            debug!("serving cached copy of {}", key);
            return Ok(cached);
        }

        if is_html_page(request.path()) {
            if let Some(fallback) = guard.match_request(&RequestKey::get(&self.offline_fallback)) {
                debug!("serving offline page for {}", key);
                return Ok(fallback);
            }
        }

        Err(err)
    }
}
