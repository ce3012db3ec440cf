//! Strata-Memory Library
//!
//! Stateful conversational memory subsystem for LLM-fronted assistants:
//! - Hierarchical per-session context store (Core / Evolving / Turn tiers)
//! - TF-IDF keyword extraction with a per-session rarity corpus
//! - Session registry with per-session locking, no global lock
//! - Crash-safe durable persistence (atomic record replacement)
//!
//! Intent classification and prompt synthesis are external collaborators:
//! callers decide a message's tier before it enters this crate, and the
//! summaries produced here feed a prompt layer that lives elsewhere.

pub mod config;
pub mod constants;
pub mod errors;
pub mod handlers;
pub mod keywords;
pub mod memory;
pub mod validation;

// Re-export dependencies to ensure tests use the same version
pub use chrono;
pub use parking_lot;
pub use uuid;
