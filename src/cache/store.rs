//! Cache Generation Module
//!
//! A named request → response store. One generation exists per deployed
//! version; it is written by install and by the caching policies.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::{CacheStats, RequestKey};
use crate::error::{Result, WorkerError};
use crate::fetch::FetchResponse;

/// Shared handle to a generation.
pub type GenerationHandle = Arc<RwLock<CacheGeneration>>;

// == Cache Generation ==
#[derive(Debug)]
pub struct CacheGeneration {
    /// Generation name, e.g. `tingyuun-cache-v1.1.0`
    name: String,
    /// Stored responses
    entries: HashMap<RequestKey, FetchResponse>,
    /// Lookup/write counters
    stats: CacheStats,
}

impl CacheGeneration {
    // == Constructor ==
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Match ==
    /// Returns a copy of the stored response for `key`.
    pub fn match_request(&mut self, key: &RequestKey) -> Option<FetchResponse> {
        match self.entries.get(key) {
            Some(response) => {
                self.stats.record_hit();
                Some(response.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Looks up without touching the counters.
    #[cfg(test)]
    pub(crate) fn peek(&self, key: &RequestKey) -> Option<&FetchResponse> {
        self.entries.get(key)
    }

    // == Put ==
    /// Stores `response` under `key`, replacing any previous entry.
    pub fn put(&mut self, key: RequestKey, response: FetchResponse) -> Result<()> {
        if !key.is_storable() {
            return Err(WorkerError::InvalidRequest(format!(
                "cannot store {}: only GET requests are cacheable",
                key
            )));
        }

        self.entries.insert(key, response);
        self.stats.record_stores(1);
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Put All ==
    /// Stores a batch as a unit: if any key is rejected nothing is written.
    pub fn put_all(&mut self, batch: Vec<(RequestKey, FetchResponse)>) -> Result<usize> {
        if let Some((key, _)) = batch.iter().find(|(key, _)| !key.is_storable()) {
            return Err(WorkerError::InvalidRequest(format!(
                "cannot store {}: only GET requests are cacheable",
                key
            )));
        }

        let count = batch.len();
        for (key, response) in batch {
            self.entries.insert(key, response);
        }
        self.stats.record_stores(count);
        self.stats.set_total_entries(self.entries.len());
        Ok(count)
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
