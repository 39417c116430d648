//! Background Tasks Module
//!
//! Work that outlives the request that started it.
//!
//! # Tasks
//! - Revalidation: refreshes a cached response after a stale copy was served

mod revalidate;

pub use revalidate::spawn_revalidation;
