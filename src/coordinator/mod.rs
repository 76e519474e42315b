//! Coordinator Module
//!
//! Sits between the history backend and its consumers: picks live or cached
//! records, derives the share-of-total percentage and mirrors mutations into
//! the cache.

mod guard;
mod history;
pub mod metrics;
mod state;

pub use guard::{AutoFetchConditions, AutoFetchGuard, AutoFetchState};
pub use history::{CoordinatorConfig, HistoryCoordinator, HistorySnapshot};
pub use state::{InFlight, QueryState};
