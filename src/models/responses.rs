//! Response DTOs for the history API
//!
//! Defines the structure of outgoing HTTP response bodies. The coordinator
//! snapshot serializes itself; these cover the cache surface and bookkeeping.

use serde::Serialize;

use crate::cache::CacheEntry;
use crate::models::Record;

/// Response body for `GET /cache/:user_id`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryResponse {
    pub user_id: String,
    pub records: Vec<Record>,
    /// Unix milliseconds of the last write to this entry
    pub cached_at: u64,
}

impl CacheEntryResponse {
    pub fn new(user_id: impl Into<String>, entry: CacheEntry) -> Self {
        Self {
            user_id: user_id.into(),
            records: entry.records,
            cached_at: entry.cached_at,
        }
    }
}

/// Response body for purge and clear operations
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Number of cache entries physically removed
    pub removed: usize,
}

impl RemovedResponse {
    pub fn new(removed: usize) -> Self {
        Self { removed }
    }
}

/// Generic acknowledgement body
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
