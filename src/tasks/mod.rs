//! Background Tasks Module
//!
//! Contains background tasks that run periodically during service operation.
//!
//! # Tasks
//! - Cache purge: physically removes expired cache entries at configured intervals

mod purge;

pub use purge::spawn_purge_task;
