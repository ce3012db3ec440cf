//! Conversational memory subsystem
//!
//! - Hierarchical per-session context store (Core / Evolving / Turn tiers)
//! - Session registry with per-session locking
//! - Durable persistence with atomic record replacement

pub mod persistence;
pub mod registry;
pub mod store;
pub mod types;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEYWORD_TOP_K, DEFAULT_MAX_CORE_CONTEXTS, DEFAULT_MAX_EVOLVING_ITEMS,
    DEFAULT_TURN_HISTORY_LIMIT,
};
use crate::errors::{Result, ValidationErrorExt};
use crate::validation;

pub use persistence::PersistenceManager;
pub use registry::{Session, SessionRegistry, SubmitOutcome};
pub use store::HierarchicalContextStore;
pub use types::*;

/// Per-session tier capacities and extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum concurrently tracked problem statements (Core tier)
    pub max_core_contexts: usize,

    /// Maximum constraints/refinements retained (Evolving tier)
    pub max_evolving_items: usize,

    /// Maximum raw conversation turns retained (Turn tier)
    pub turn_history_limit: usize,

    /// Keywords cached per Core/Evolving entry
    pub keyword_top_k: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_core_contexts: DEFAULT_MAX_CORE_CONTEXTS,
            max_evolving_items: DEFAULT_MAX_EVOLVING_ITEMS,
            turn_history_limit: DEFAULT_TURN_HISTORY_LIMIT,
            keyword_top_k: DEFAULT_KEYWORD_TOP_K,
        }
    }
}

impl ContextConfig {
    /// Reject out-of-range limits before any session is built with them
    pub fn validate(&self) -> Result<()> {
        validation::validate_tier_limit("max_core_contexts", self.max_core_contexts)
            .map_validation_err("max_core_contexts")?;
        validation::validate_tier_limit("max_evolving_items", self.max_evolving_items)
            .map_validation_err("max_evolving_items")?;
        validation::validate_tier_limit("turn_history_limit", self.turn_history_limit)
            .map_validation_err("turn_history_limit")?;
        validation::validate_tier_limit("keyword_top_k", self.keyword_top_k)
            .map_validation_err("keyword_top_k")?;
        Ok(())
    }
}
