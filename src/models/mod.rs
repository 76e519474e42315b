//! Domain records and HTTP DTOs
//!
//! `record` holds the history types exchanged with the backend; `requests`
//! and `responses` are the bodies of the local HTTP surface.

pub mod record;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use record::{NewRecord, Record, RecordUpdate};
pub use requests::SessionRequest;
pub use responses::{
    CacheEntryResponse, ErrorResponse, HealthResponse, MessageResponse, RemovedResponse,
};
