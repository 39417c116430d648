//! Cache Storage Module
//!
//! The set of named generations visible to the worker.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheGeneration, GenerationHandle};
use crate::error::Result;

/// Named generations. Abstracted so activation can be exercised against a
/// backend whose deletes fail.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the generation named `name`, creating it if absent.
    async fn open(&self, name: &str) -> Result<GenerationHandle>;

    /// Looks up an existing generation without creating it.
    async fn get(&self, name: &str) -> Result<Option<GenerationHandle>>;

    async fn has(&self, name: &str) -> Result<bool>;

    /// Deletes a whole generation. `Ok(false)` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of all existing generations.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    generations: RwLock<BTreeMap<String, GenerationHandle>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<GenerationHandle> {
        if let Some(handle) = self.generations.read().await.get(name) {
            return Ok(handle.clone());
        }

        let mut generations = self.generations.write().await;
        let handle = generations
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(CacheGeneration::new(name))));
        Ok(handle.clone())
    }

    async fn get(&self, name: &str) -> Result<Option<GenerationHandle>> {
        Ok(self.generations.read().await.get(name).cloned())
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.generations.read().await.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.generations.write().await.remove(name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.generations.read().await.keys().cloned().collect())
    }
}
