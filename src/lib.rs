//! Tingyuun Worker - An offline-first caching proxy for a static site
//!
//! Versioned cache generations, asset pre-caching on install, stale
//! generation cleanup on activate, and per-request-class caching policies
//! (cache-first, network-first, stale-while-revalidate).

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod manifest;
pub mod models;
pub mod registration;
pub mod registry;
pub mod router;
pub mod strategy;
pub mod tasks;
pub mod worker;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{Result, WorkerError};
pub use registration::{RegisterOutcome, Registration};
pub use worker::{ServiceWorker, WorkerSettings};
