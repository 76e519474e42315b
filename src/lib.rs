//! History Cache - per-user history cache and reconciliation layer
//!
//! Keeps a time-bounded per-user cache of history records, falls back to it
//! while live data is loading, and mirrors backend mutations into it.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod service;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, SharedCache};
pub use config::Config;
pub use coordinator::{CoordinatorConfig, HistoryCoordinator, HistorySnapshot};
pub use error::{HistoryError, Result};
pub use tasks::spawn_purge_task;
