//! Registration
//!
//! Owns the worker versions for one origin: at most one active worker that
//! answers fetches and at most one installed worker waiting to take over.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::cache::CacheStorage;
use crate::error::Result;
use crate::fetch::{FetchRequest, FetchResponse, Network};
use crate::lifecycle::{ActivationReport, InstallReport};
use crate::models::ControlMessage;
use crate::worker::{ServiceWorker, WorkerSettings};

/// What `register` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// This generation is already active or waiting.
    Unchanged,
    /// Installed and took control.
    Activated {
        install: InstallReport,
        activation: ActivationReport,
    },
    /// Installed; waiting for skip-waiting while the previous version serves.
    Waiting(InstallReport),
}

pub struct Registration {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    active: RwLock<Option<Arc<ServiceWorker>>>,
    waiting: RwLock<Option<Arc<ServiceWorker>>>,
    /// Serializes install and activation across versions
    lifecycle: Mutex<()>,
}

impl Registration {
    pub fn new(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            storage,
            network,
            active: RwLock::new(None),
            waiting: RwLock::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub async fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.read().await.clone()
    }

    /// True when a newer version is installed but an older one still serves.
    pub async fn update_available(&self) -> bool {
        self.waiting.read().await.is_some() && self.active.read().await.is_some()
    }

    // == Register ==
    /// Installs `settings` as a new worker version unless its generation is
    /// already active or waiting.
    ///
    /// A failed install leaves the current active worker in place; calling
    /// `register` again retries.
    pub async fn register(&self, settings: WorkerSettings) -> Result<RegisterOutcome> {
        let _lifecycle = self.lifecycle.lock().await;
        let generation = settings.naming.generation_name();

        for slot in [&self.active, &self.waiting] {
            if let Some(worker) = slot.read().await.as_ref() {
                if worker.generation_name() == generation {
                    return Ok(RegisterOutcome::Unchanged);
                }
            }
        }

        let worker = Arc::new(ServiceWorker::new(
            settings,
            self.storage.clone(),
            self.network.clone(),
        )?);
        let install = worker.install().await?;

        let has_active = self.active.read().await.is_some();
        if !has_active || worker.skip_waiting_requested() {
            let activation = self.promote(worker).await?;
            return Ok(RegisterOutcome::Activated {
                install,
                activation,
            });
        }

        let previous = self.waiting.write().await.replace(worker);
        if let Some(previous) = previous {
            previous.mark_redundant().await;
        }
        info!(
            "New version {} installed and waiting; it activates once pages are refreshed or skip-waiting is sent",
            generation
        );
        Ok(RegisterOutcome::Waiting(install))
    }

    // == Messages ==
    /// Delivers a control message. A skip-waiting message activates the
    /// waiting worker, if there is one.
    pub async fn post_message(&self, message: &ControlMessage) -> Result<Option<ActivationReport>> {
        let _lifecycle = self.lifecycle.lock().await;

        let Some(waiting) = self.waiting().await else {
            if let Some(active) = self.active().await {
                active.handle_message(message);
            }
            return Ok(None);
        };

        if waiting.handle_message(message) {
            return self.promote(waiting).await.map(Some);
        }
        Ok(None)
    }

    /// Makes `worker` the active worker and runs its activation. The worker
    /// it replaces becomes redundant, and so does any other waiting worker:
    /// its generation is about to be deleted.
    async fn promote(&self, worker: Arc<ServiceWorker>) -> Result<ActivationReport> {
        let waiting = self.waiting.write().await.take();
        if let Some(waiting) = waiting.filter(|w| !Arc::ptr_eq(w, &worker)) {
            info!(
                "Waiting worker {} ({}) superseded by {}",
                waiting.id(),
                waiting.version(),
                worker.version()
            );
            waiting.mark_redundant().await;
        }

        let previous = self.active.write().await.replace(worker.clone());
        if let Some(previous) = previous {
            info!(
                "Worker {} ({}) replaced by {}",
                previous.id(),
                previous.version(),
                worker.version()
            );
            previous.mark_redundant().await;
        }

        let report = worker.activate().await?;
        if !report.failed.is_empty() {
            warn!(
                "{} stale generation(s) could not be deleted",
                report.failed.len()
            );
        }
        Ok(report)
    }

    // == Fetch ==
    /// Routes a request through the active worker. `None` means nothing
    /// intercepted it and the caller should use the network directly.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Option<Result<FetchResponse>> {
        let active = self.active().await?;
        active.handle_fetch(request).await
    }
}
