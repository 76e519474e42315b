//! Request DTOs for the history API
//!
//! Defines the structure of incoming HTTP request bodies. Record payloads
//! (`NewRecord`, `RecordUpdate`) are accepted as-is from [`super::record`].

use serde::Deserialize;

/// Request body for `PUT /session`
///
/// Switches the active user and/or credential. A missing field means
/// "signed out" for that half of the session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl SessionRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if matches!(self.user_id.as_deref(), Some("")) {
            return Some("User id cannot be empty".to_string());
        }
        None
    }
}
