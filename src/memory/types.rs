//! Core types for the hierarchical context store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::constants::{DEFAULT_SESSION_ID, SNAPSHOT_SCHEMA_VERSION};
use crate::keywords::{Corpus, KeywordEntry};

/// Unique session identifier
///
/// Generated ids are UUID v4 in simple (dashless) form; the reserved id
/// `"default"` names the fallback session used when a caller supplies none.
/// Ids double as durable record file names, so the accepted charset is
/// restricted (see `validation::validate_session_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh collision-resistant id (random 128-bit token)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// The reserved fallback session id
    pub fn default_session() -> Self {
        Self(DEFAULT_SESSION_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting mutations
    Active,
    /// Frozen by `end_session`: readable, immutable, not yet deleted
    Ended,
}

/// Session metadata carried in snapshots and listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub status: SessionStatus,

    /// When this session last reached durable storage
    #[serde(default)]
    pub last_flushed_at: Option<DateTime<Utc>>,
}

impl SessionMeta {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            last_active_at: now,
            status: SessionStatus::Active,
            last_flushed_at: None,
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

/// Message sender role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Context tier a classified message is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextTier {
    /// Problem definitions (long-term)
    Core,
    /// Constraints, decisions, refinements (medium-term)
    Evolving,
    /// Raw conversation history only (short-term)
    Turn,
}

/// A problem statement tracked in the Core tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Ranked keywords, cached at insert time
    pub keywords: Vec<KeywordEntry>,
}

/// A constraint or refinement tracked in the Evolving tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolvingEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Ranked keywords, cached at insert time
    pub keywords: Vec<KeywordEntry>,
}

/// A verbatim conversation turn. No keyword extraction at this tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// One line of recent conversation in a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnLine {
    pub role: Role,
    pub text: String,
}

/// Deterministic combination of all three tiers, consumed by the prompt
/// layer. Assembled purely from cached state; building a summary never
/// performs extraction work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSummary {
    /// All Core problem statements, oldest first, verbatim
    pub core_problems: Vec<String>,

    /// Top-weighted keywords merged across every Evolving entry
    pub evolving_keywords: Vec<KeywordEntry>,

    /// All current Turn entries, oldest first, verbatim
    pub recent_turns: Vec<TurnLine>,
}

impl ContextSummary {
    pub fn is_empty(&self) -> bool {
        self.core_problems.is_empty()
            && self.evolving_keywords.is_empty()
            && self.recent_turns.is_empty()
    }
}

/// Complete serializable representation of a session's context state
///
/// The unit of export/import and of the durable record. `import` validates
/// the whole snapshot before applying any of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub session: SessionMeta,
    pub core: Vec<CoreEntry>,
    pub evolving: Vec<EvolvingEntry>,
    pub turn: Vec<TurnEntry>,
    pub corpus: Corpus,
}

impl Snapshot {
    pub fn current_version() -> u32 {
        SNAPSHOT_SCHEMA_VERSION
    }
}

/// Session listing entry, most-recently-active first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub turn_count: usize,
}

/// Per-session statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: SessionId,
    pub status: SessionStatus,

    /// Message counts per tier
    pub core_count: usize,
    pub evolving_count: usize,
    pub turn_count: usize,

    /// Constraints currently narrowing the solution space
    pub active_constraints: usize,

    /// Cached keywords across Core and Evolving entries
    pub total_keywords: usize,
    pub avg_keyword_weight: f32,

    /// Corpus counters
    pub corpus_documents: u64,
    pub corpus_unique_terms: usize,
}
