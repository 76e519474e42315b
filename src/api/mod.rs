//! API Module
//!
//! HTTP handlers and routing exposing the history view and the cache store
//! to a local UI.
//!
//! # Endpoints
//! - `/history` - coordinator snapshot and mutations
//! - `/session` - user and credential changes
//! - `/cache` - direct cache store access
//! - `/purge` - expired entry purge
//! - `/health` - health check

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
