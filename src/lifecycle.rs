//! Lifecycle Controller
//!
//! Install, activate and forced-update handling for a [`ServiceWorker`].
//!
//! ```text
//! Installing ──install ok──▶ Installed ──activate──▶ Activating ──▶ Active
//!     │                                                               │
//!     └──install failed──▶ Redundant ◀──replaced by a newer version───┘
//! ```

use std::fmt;
use std::sync::atomic::Ordering;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::RequestKey;
use crate::error::{AssetFailure, Result, WorkerError};
use crate::fetch::{CacheMode, FetchRequest};
use crate::models::ControlMessage;
use crate::worker::ServiceWorker;

// == Worker State ==
/// Where a worker version is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created; pre-caching the manifest. Left by a finished install.
    Installing,
    /// Manifest cached; waiting until no older version controls pages or
    /// until skip-waiting is requested.
    Installed,
    /// Evicting stale generations. Fetches are already routed here.
    Activating,
    /// Controls all open pages.
    Active,
    /// Install failed or a newer version took over. Terminal.
    Redundant,
}

impl WorkerState {
    /// States in which the worker answers fetches.
    pub fn controls_clients(self) -> bool {
        matches!(self, WorkerState::Activating | WorkerState::Active)
    }

    pub fn is_terminal(self) -> bool {
        self == WorkerState::Redundant
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Reports ==
/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Number of manifest responses written
    pub stored: usize,
}

/// A stale generation that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionFailure {
    pub generation: String,
    pub reason: String,
}

/// Result of activation. Activation itself never fails once started;
/// individual deletions may.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub generation: String,
    pub deleted: Vec<String>,
    pub failed: Vec<DeletionFailure>,
    pub clients_claimed: bool,
}

impl ServiceWorker {
    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<()> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(WorkerError::InvalidState {
                expected: from.as_str(),
                actual: state.to_string(),
            });
        }
        debug!("worker {} {} -> {}", self.id(), from, to);
        *state = to;
        Ok(())
    }

    // == Install ==
    /// Pre-caches every manifest entry into this version's generation.
    ///
    /// Entries are fetched bypassing HTTP caches. Nothing is stored unless
    /// every entry came back ok; the error then lists each failed entry and
    /// the worker becomes redundant.
    pub async fn install(&self) -> Result<InstallReport> {
        let current = self.state().await;
        if current != WorkerState::Installing {
            return Err(WorkerError::InvalidState {
                expected: WorkerState::Installing.as_str(),
                actual: current.to_string(),
            });
        }
        info!(
            "Installing worker {} ({})",
            self.id(),
            self.version()
        );

        match self.precache().await {
            Ok(report) => {
                self.transition(WorkerState::Installing, WorkerState::Installed)
                    .await?;
                info!(
                    "Cached {} assets into {}",
                    report.stored, report.generation
                );
                if self.settings.auto_skip_waiting {
                    self.skip_waiting.store(true, Ordering::SeqCst);
                }
                Ok(report)
            }
            Err(err) => {
                if let WorkerError::InstallFailed { failures, .. } = &err {
                    for failure in failures {
                        warn!("Pre-cache failed for {}", failure);
                    }
                }
                error!("Cache installation failed: {}", err);
                self.mark_redundant().await;
                Err(err)
            }
        }
    }

    async fn precache(&self) -> Result<InstallReport> {
        let generation_name = self.generation_name();
        let generation = self.storage.open(&generation_name).await?;
        let entries = self.settings.manifest.resolve(&self.settings.origin)?;

        let fetches = entries.iter().map(|(path, url)| async move {
            let request = FetchRequest::get(url.clone()).with_cache_mode(CacheMode::Reload);
            (path, url, self.network.fetch(&request).await)
        });

        let mut batch = Vec::with_capacity(entries.len());
        let mut failures = Vec::new();
        for (path, url, result) in join_all(fetches).await {
            match result {
                Ok(response) if response.ok() => batch.push((RequestKey::get(url), response)),
                Ok(response) => failures.push(AssetFailure {
                    path: path.clone(),
                    reason: format!("status {}", response.status.as_u16()),
                }),
                Err(err) => failures.push(AssetFailure {
                    path: path.clone(),
                    reason: err.to_string(),
                }),
            }
        }

        if !failures.is_empty() {
            return Err(WorkerError::InstallFailed {
                generation: generation_name,
                failures,
            });
        }

        let stored = generation.write().await.put_all(batch)?;
        Ok(InstallReport {
            generation: generation_name,
            stored,
        })
    }

    // == Activate ==
    /// Deletes every generation with this site's prefix other than this
    /// version's, then claims open pages.
    ///
    /// Each deletion is independent: a failure is logged and recorded and
    /// the remaining generations are still deleted.
    pub async fn activate(&self) -> Result<ActivationReport> {
        self.transition(WorkerState::Installed, WorkerState::Activating)
            .await?;
        info!("Activating worker {} ({})", self.id(), self.version());

        let generation = self.generation_name();
        let mut report = ActivationReport {
            generation: generation.clone(),
            deleted: Vec::new(),
            failed: Vec::new(),
            clients_claimed: false,
        };

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                error!("Could not list cache generations: {}", e);
                Vec::new()
            }
        };

        for name in names
            .into_iter()
            .filter(|name| self.settings.naming.is_stale(name))
        {
            match self.storage.delete(&name).await {
                Ok(_) => {
                    info!("Deleted old cache: {}", name);
                    report.deleted.push(name);
                }
                Err(e) => {
                    warn!("Failed to delete old cache {}: {}", name, e);
                    report.failed.push(DeletionFailure {
                        generation: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.clients_claimed.store(true, Ordering::SeqCst);
        report.clients_claimed = true;
        self.transition(WorkerState::Activating, WorkerState::Active)
            .await?;
        info!("Worker {} activated, serving from {}", self.id(), generation);

        Ok(report)
    }

    // == Messages ==
    /// Handles a control message. Returns true if it requested skip-waiting.
    pub fn handle_message(&self, message: &ControlMessage) -> bool {
        if message.is_skip_waiting() {
            info!("Worker {} received skip-waiting", self.id());
            self.skip_waiting.store(true, Ordering::SeqCst);
            true
        } else {
            debug!("Ignoring control message {:?}", message.kind);
            false
        }
    }

    pub async fn mark_redundant(&self) {
        let mut state = self.state.write().await;
        if !state.is_terminal() {
            debug!("worker {} {} -> redundant", self.id(), *state);
            *state = WorkerState::Redundant;
        }
    }
}
