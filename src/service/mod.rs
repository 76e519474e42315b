//! History Service Module
//!
//! The seam to the remote history backend. The coordinator only talks to a
//! [`HistoryService`]; `http` implements it over reqwest and `memory` keeps
//! everything in process for tests and local demos.

mod http;
mod memory;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::{NewRecord, Record, RecordUpdate};

pub use http::HttpHistoryService;
pub use memory::MemoryHistoryService;

// == Mutation Response ==
/// Outcome of a backend mutation.
///
/// Mirrors the backend's `{ success, data, error }` envelope: a failed
/// mutation is a normal answer, not a transport error.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> MutationResponse<T> {
    /// A successful mutation carrying the canonical result.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A rejected mutation with an optional reason.
    pub fn failed(error: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error,
        }
    }
}

impl<T> From<ServiceError> for MutationResponse<T> {
    fn from(err: ServiceError) -> Self {
        Self::failed(Some(err.to_string()))
    }
}

// == History Service ==
/// Remote operations the coordinator depends on.
///
/// Implementations own their retry policy; the coordinator never retries.
#[async_trait]
pub trait HistoryService: Send + Sync {
    /// Fetches every record owned by `user_id`.
    async fn list(
        &self,
        user_id: &str,
        credential: Option<&str>,
    ) -> Result<Vec<Record>, ServiceError>;

    /// Fetches the global total all users' values are measured against.
    async fn total(&self) -> Result<f64, ServiceError>;

    async fn create(&self, credential: Option<&str>, payload: NewRecord)
        -> MutationResponse<Record>;

    async fn update(
        &self,
        credential: Option<&str>,
        id: &str,
        payload: RecordUpdate,
    ) -> MutationResponse<Record>;

    async fn delete(&self, credential: Option<&str>, id: &str) -> MutationResponse<()>;
}
