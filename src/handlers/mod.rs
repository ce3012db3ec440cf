//! HTTP API handlers
//!
//! Thin facade over the memory subsystem: handlers validate input, call into
//! `ContextService`, and shape typed responses. No context semantics live
//! here.

pub mod health;
pub mod messages;
pub mod router;
pub mod sessions;
pub mod state;

pub use router::build_router;
pub use state::{AppState, ContextService};
