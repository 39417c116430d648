//! Generation Statistics Module
//!
//! Tracks lookups and writes against a single cache generation.

use serde::Serialize;

// == Cache Stats ==
/// Per-generation counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that found a stored response
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Responses written (install batch entries count individually)
    pub stores: u64,
    /// Current number of stored responses
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_stores(&mut self, count: usize) {
        self.stores += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
