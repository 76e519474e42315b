//! History record types
//!
//! Records are owned by the history backend; the cache only ever looks at
//! `id` and `value`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Record ==
/// A single history record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique record identifier
    pub id: String,
    /// Identifier of the owning user
    pub user_id: String,
    /// Numeric amount contributing to the user's share of the global total
    pub value: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Creates a record stamped with the current time.
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, value: f64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            value,
            created_at: now,
            updated_at: now,
        }
    }
}

// == Payloads ==
/// Payload for creating a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub user_id: String,
    pub value: f64,
}

/// Payload for updating a record. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}
