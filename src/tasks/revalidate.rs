//! Background Revalidation Task
//!
//! Fetches a fresh copy of a cached response and writes it back when ok.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{GenerationHandle, RequestKey};
use crate::error::Result;
use crate::fetch::{FetchRequest, FetchResponse, Network};
use crate::strategy::store_if_ok;

/// Spawns a task that fetches `request` and stores the result in
/// `generation` if it is ok.
///
/// The handle resolves to the network result, so a caller without a cached
/// copy can await it. Callers that already answered may drop the handle; the
/// task still runs to completion.
pub fn spawn_revalidation(
    network: Arc<dyn Network>,
    generation: GenerationHandle,
    request: FetchRequest,
) -> JoinHandle<Result<FetchResponse>> {
    tokio::spawn(async move {
        let key = RequestKey::from_request(&request);

        match network.fetch(&request).await {
            Ok(response) => {
                debug!("revalidated {} -> {}", key, response.status);
                store_if_ok(&generation, key, &response).await;
                Ok(response)
            }
            Err(err) => {
                warn!("revalidation of {} failed: {}", key, err);
                Err(err)
            }
        }
    })
}
