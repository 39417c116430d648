//! Cache Module
//!
//! Versioned cache generations: request keys, stored responses, the
//! per-generation store and the storage that names generations.

mod key;
mod stats;
mod storage;
mod store;


// Re-export public types
pub use key::RequestKey;
pub use stats::CacheStats;
pub use storage::{CacheStorage, MemoryCacheStorage};
pub use store::{CacheGeneration, GenerationHandle};
