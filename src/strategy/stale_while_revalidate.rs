//! Stale-while-revalidate: answer from the cache, refresh in the background.

use tracing::debug;

use super::PolicyExecutor;
use crate::cache::RequestKey;
use crate::error::{Result, WorkerError};
use crate::fetch::{FetchRequest, FetchResponse};
use crate::tasks::spawn_revalidation;

impl PolicyExecutor {
    /// The revalidation fetch always starts. A cached copy is returned
    /// without waiting for it; on a miss the caller waits for its result.
    pub async fn stale_while_revalidate(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let Some(generation) = self.generation().await? else {
            return self.network.fetch(request).await;
        };
        let key = RequestKey::from_request(request);

        let cached = generation.write().await.match_request(&key);
        let revalidation = spawn_revalidation(self.network.clone(), generation, request.clone());

        match cached {
            Some(cached) => {
                debug!("serving stale copy of {} while revalidating", key);
                Ok(cached)
            }
            None => revalidation
                .await
                .map_err(|e| WorkerError::Internal(format!("revalidation of {} failed: {}", key, e)))?,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::error::WorkerError;
    use crate::strategy::testing::*;

    #[tokio::test]
    async fn test_miss_waits_for_network_and_stores() {
        let fx = Fixture::new().await;
        fx.network.serve(url("/images/favicon.png").as_str(), "png");

        let resp = fx
            .executor
            .stale_while_revalidate(&get("/images/favicon.png"))
            .await
            .unwrap();
        assert_eq!(resp.body, "png");
        assert_eq!(fx.cached_body("/images/favicon.png").await.unwrap(), "png");
    }

    #[tokio::test]
    async fn test_hit_is_not_delayed_by_slow_network() {
        let fx = Fixture::new().await;
        fx.seed("/images/profiles/1.webp", "old").await;
        fx.network.serve(url("/images/profiles/1.webp").as_str(), "new");
        fx.network.set_delay(Some(Duration::from_secs(5)));

        let resp = tokio::time::timeout(
            Duration::from_millis(500),
            fx.executor.stale_while_revalidate(&get("/images/profiles/1.webp")),
        )
        .await
        .expect("cached response should not wait for the network")
        .unwrap();

        assert_eq!(resp.body, "old");
    }

    #[tokio::test]
    async fn test_hit_is_refreshed_in_background() {
        let fx = Fixture::new().await;
        fx.seed("/images/icon-192.png", "old").await;
        fx.network.serve(url("/images/icon-192.png").as_str(), "new");

        let resp = fx
            .executor
            .stale_while_revalidate(&get("/images/icon-192.png"))
            .await
            .unwrap();
        assert_eq!(resp.body, "old");

        let mut refreshed = false;
        for _ in 0..50 {
            if fx.cached_body("/images/icon-192.png").await.unwrap() == "new" {
                refreshed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(refreshed, "background fetch should update the cache");
    }

    #[tokio::test]
    async fn test_hit_survives_offline() {
        let fx = Fixture::new().await;
        fx.seed("/images/favicon.webp", "cached").await;
        fx.network.set_offline(true);

        let resp = fx
            .executor
            .stale_while_revalidate(&get("/images/favicon.webp"))
            .await
            .unwrap();
        assert_eq!(resp.body, "cached");
    }

    #[tokio::test]
    async fn test_miss_offline_propagates() {
        let fx = Fixture::new().await;
        fx.network.set_offline(true);

        let result = fx
            .executor
            .stale_while_revalidate(&get("/images/gallery/1.webp"))
            .await;
        assert!(matches!(result, Err(WorkerError::Network(_))));
    }
}
