//! Cache-first: serve from the generation, fall back to the network on a miss.

use tracing::debug;

use super::{store_if_ok, PolicyExecutor};
use crate::cache::RequestKey;
use crate::error::Result;
use crate::fetch::{FetchRequest, FetchResponse};

impl PolicyExecutor {
    /// A hit never reaches the network. On a miss the network response is
    /// stored when ok and returned either way; network errors propagate.
    pub async fn cache_first(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let Some(generation) = self.generation().await? else {
            return self.network.fetch(request).await;
        };
        let key = RequestKey::from_request(request);

        let cached = generation.write().await.match_request(&key);
        if let Some(cached) = cached {
            debug!("cache-first hit: {}", key);
            return Ok(cached);
        }

        let response = self.network.fetch(request).await?;
        store_if_ok(&generation, key, &response).await;
        Ok(response)
    }
}
