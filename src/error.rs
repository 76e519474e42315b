//! Error types for the history cache
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Mutation Kind ==
/// The three mutation operations mirrored into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    /// Message used when the backend rejects a mutation without saying why.
    pub fn fallback_message(self) -> &'static str {
        match self {
            MutationKind::Create => "Failed to create history",
            MutationKind::Update => "Failed to update history",
            MutationKind::Delete => "Failed to delete history",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

// == History Error Enum ==
/// Unified error type for the history cache.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Backend rejected a mutation; message is shown to the user verbatim
    #[error("{message}")]
    Mutation { kind: MutationKind, message: String },

    /// Nothing cached (or only stale data) for the requested user
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HistoryError {
    /// Builds a mutation error, falling back to the per-operation message when
    /// the backend supplied none.
    pub fn mutation(kind: MutationKind, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| kind.fallback_message().to_string());
        HistoryError::Mutation { kind, message }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for HistoryError {
    fn into_response(self) -> Response {
        let status = match &self {
            HistoryError::Mutation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HistoryError::NotFound(_) => StatusCode::NOT_FOUND,
            HistoryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HistoryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Service Error Enum ==
/// Failures from the history backend transport.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Backend answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Request never completed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with something we could not read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

// == Result Type Alias ==
/// Convenience Result type for the history cache.
pub type Result<T> = std::result::Result<T, HistoryError>;
