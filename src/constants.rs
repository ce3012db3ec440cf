//! Documented constants for the context store
//!
//! Centralizing tunables prevents magic numbers scattered through the tiers
//! and keeps the configuration surface in one place.

// =============================================================================
// TIER CAPACITIES
// =============================================================================

/// Default number of concurrently tracked problem statements (Core tier).
///
/// The Core tier holds verbatim problem definitions. Three entries cover a
/// conversation that pivots between a small number of top-level goals; the
/// oldest is evicted when a fourth arrives.
pub const DEFAULT_MAX_CORE_CONTEXTS: usize = 3;

/// Default capacity of the Evolving tier (constraints, decisions, refinements).
///
/// FIFO eviction: once full, each new constraint displaces the oldest,
/// implementing progressive narrowing of the solution space.
pub const DEFAULT_MAX_EVOLVING_ITEMS: usize = 10;

/// Default capacity of the Turn tier.
///
/// Six messages = two to three user/assistant exchange pairs of raw
/// conversation history.
pub const DEFAULT_TURN_HISTORY_LIMIT: usize = 6;

/// Hard ceiling for any configured tier capacity.
///
/// Configured limits above this are rejected at startup and at import time.
pub const MAX_TIER_CAPACITY: usize = 1_000;

// =============================================================================
// KEYWORD EXTRACTION
// =============================================================================

/// Default number of ranked keywords cached per Core/Evolving entry.
pub const DEFAULT_KEYWORD_TOP_K: usize = 5;

/// Minimum token length (in characters) kept by the tokenizer.
///
/// Single characters are noise in both Latin and kana text.
pub const MIN_TOKEN_LENGTH: usize = 2;

/// Maximum number of merged keywords reported in a context summary's
/// Evolving aggregate.
pub const EVOLVING_SUMMARY_KEYWORDS: usize = 8;

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Schema version stamped into every exported snapshot and durable record.
///
/// Import and startup load reject records carrying any other version.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// File extension of durable session records.
pub const RECORD_EXTENSION: &str = "json";

/// Suffix of the scratch file a flush writes before the atomic rename.
pub const RECORD_TMP_SUFFIX: &str = "tmp";

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 7070;

/// Default durable storage directory.
pub const DEFAULT_STORAGE_PATH: &str = "./strata_data";

/// Default maximum concurrent in-flight requests.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 200;

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum time allowed for the shutdown flush-all pass, in seconds.
pub const SHUTDOWN_FLUSH_TIMEOUT_SECS: u64 = 10;

/// Maximum accepted session id length. Ids become durable record file names.
pub const MAX_SESSION_ID_LENGTH: usize = 64;

/// Reserved id of the lazily-created fallback session.
pub const DEFAULT_SESSION_ID: &str = "default";
