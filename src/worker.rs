//! Service Worker
//!
//! One deployed version of the caching worker: its settings, its router and
//! the executor bound to its generation. Lifecycle steps live in
//! [`crate::lifecycle`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::cache::CacheStorage;
use crate::error::{Result, WorkerError};
use crate::fetch::{FetchRequest, FetchResponse, Network};
use crate::lifecycle::WorkerState;
use crate::manifest::{AssetManifest, OFFLINE_FALLBACK};
use crate::registry::{CacheNaming, VersionTag};
use crate::router::{RequestRouter, Route};
use crate::strategy::PolicyExecutor;

// == Worker Settings ==
/// Everything a worker version needs, passed in at construction.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// The site's origin; only requests to it are intercepted
    pub origin: Url,
    pub naming: CacheNaming,
    pub manifest: AssetManifest,
    /// Ask to skip the waiting phase as soon as install succeeds
    pub auto_skip_waiting: bool,
}

impl WorkerSettings {
    pub fn new(origin: Url, naming: CacheNaming, manifest: AssetManifest) -> Self {
        Self {
            origin,
            naming,
            manifest,
            auto_skip_waiting: true,
        }
    }

    pub fn with_auto_skip_waiting(mut self, auto_skip_waiting: bool) -> Self {
        self.auto_skip_waiting = auto_skip_waiting;
        self
    }

    /// Checks the manifest against the origin.
    pub fn validate(&self) -> Result<()> {
        if self.origin.cannot_be_a_base() {
            return Err(WorkerError::Config(format!(
                "origin '{}' cannot resolve paths",
                self.origin
            )));
        }
        self.manifest.resolve(&self.origin).map(|_| ())
    }

    pub fn offline_fallback_url(&self) -> Result<Url> {
        self.origin
            .join(OFFLINE_FALLBACK)
            .map_err(|e| WorkerError::Config(format!("invalid origin: {}", e)))
    }
}

// == Worker Info ==
/// Snapshot used by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerInfo {
    pub id: u64,
    pub version: String,
    pub generation: String,
    pub state: WorkerState,
    pub clients_claimed: bool,
}

// == Service Worker ==
pub struct ServiceWorker {
    id: u64,
    pub(crate) settings: WorkerSettings,
    pub(crate) storage: Arc<dyn CacheStorage>,
    pub(crate) network: Arc<dyn Network>,
    router: RequestRouter,
    executor: PolicyExecutor,
    pub(crate) state: RwLock<WorkerState>,
    pub(crate) skip_waiting: AtomicBool,
    pub(crate) clients_claimed: AtomicBool,
}

impl ServiceWorker {
    /// Creates a worker in the `Installing` state.
    pub fn new(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Result<Self> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        settings.validate()?;
        let router = RequestRouter::new(&settings.origin);
        let executor = PolicyExecutor::new(
            network.clone(),
            storage.clone(),
            settings.naming.generation_name(),
            settings.offline_fallback_url()?,
        );

        Ok(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            settings,
            storage,
            network,
            router,
            executor,
            state: RwLock::new(WorkerState::Installing),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn version(&self) -> VersionTag {
        self.settings.naming.version()
    }

    pub fn generation_name(&self) -> String {
        self.settings.naming.generation_name()
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    pub async fn info(&self) -> WorkerInfo {
        WorkerInfo {
            id: self.id,
            version: self.version().to_string(),
            generation: self.generation_name(),
            state: self.state().await,
            clients_claimed: self.clients_claimed(),
        }
    }

    // == Fetch ==
    /// Resolves an intercepted request.
    ///
    /// `None` means the request is not intercepted: it is cross-origin or
    /// this worker is not controlling pages.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Option<Result<FetchResponse>> {
        if !self.state().await.controls_clients() {
            return None;
        }
        match self.router.route(&request.url) {
            Route::Bypass => {
                debug!("not intercepting cross-origin {}", request.url);
                None
            }
            Route::Handle(_, policy) => Some(self.executor.execute(policy, request).await),
        }
    }
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("id", &self.id)
            .field("generation", &self.generation_name())
            .finish()
    }
}
