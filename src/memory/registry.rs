//! Session registry
//!
//! Owns every live session and routes operations to the right store. The
//! map is a `DashMap` of per-session `RwLock`s: mutations on one session are
//! linearized by its own lock while distinct sessions proceed in parallel —
//! there is no global lock anywhere on the mutation path.
//!
//! Unknown session ids are always an error. The registry never invents a
//! session behind the caller's back; the only implicit session is the
//! explicitly-named `"default"` fallback, used when no id is supplied at
//! all, and strict mode disables even that.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use super::store::HierarchicalContextStore;
use super::types::*;
use super::ContextConfig;
use crate::errors::{AppError, Result};
use crate::keywords::{KeywordEntry, KeywordExtractor};

/// A session: metadata plus its context store
#[derive(Debug)]
pub struct Session {
    pub meta: SessionMeta,
    pub store: HierarchicalContextStore,
}

impl Session {
    fn new(id: SessionId, config: ContextConfig, extractor: Arc<KeywordExtractor>) -> Self {
        Self {
            meta: SessionMeta::new(id),
            store: HierarchicalContextStore::new(config, extractor),
        }
    }

    /// Full-state snapshot, captured inside the caller's critical section
    pub fn snapshot(&self) -> Snapshot {
        self.store.export(&self.meta)
    }

    fn ensure_active(&self) -> Result<()> {
        match self.meta.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Ended => Err(AppError::SessionEnded(self.meta.id.to_string())),
        }
    }
}

/// Result of routing one classified message into a session
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub session_id: SessionId,
    pub tier: ContextTier,

    /// Keywords cached for the entry (empty for Turn-only messages)
    pub keywords: Vec<KeywordEntry>,
}

pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<RwLock<Session>>>,
    extractor: Arc<KeywordExtractor>,
    context_config: ContextConfig,

    /// When set, a request without a session id is rejected instead of
    /// falling back to the default session.
    strict_sessions: bool,
}

impl SessionRegistry {
    pub fn new(context_config: ContextConfig, strict_sessions: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            extractor: Arc::new(KeywordExtractor::new()),
            context_config,
            strict_sessions,
        }
    }

    /// Start a new session with a fresh collision-resistant id
    pub fn start_session(&self) -> SessionId {
        let id = SessionId::generate();
        let session = Session::new(
            id.clone(),
            self.context_config.clone(),
            Arc::clone(&self.extractor),
        );
        self.sessions
            .insert(id.clone(), Arc::new(RwLock::new(session)));

        info!(session_id = %id, "Session started");
        id
    }

    /// Reconstruct a session from a durable snapshot (startup path)
    pub fn restore_session(&self, snapshot: Snapshot) -> Result<SessionId> {
        let id = snapshot.session.id.clone();
        let meta = snapshot.session.clone();

        let mut session = Session::new(
            id.clone(),
            self.context_config.clone(),
            Arc::clone(&self.extractor),
        );
        session.store.import(snapshot)?;
        session.meta = meta;

        self.sessions
            .insert(id.clone(), Arc::new(RwLock::new(session)));
        debug!(session_id = %id, "Session restored from durable record");
        Ok(id)
    }

    /// Look up a session. `None` falls back to the lazily-created default
    /// session unless strict mode is on; an unknown id is always an error.
    pub fn resolve(&self, id: Option<&SessionId>) -> Result<Arc<RwLock<Session>>> {
        match id {
            Some(id) => self
                .sessions
                .get(id)
                .map(|entry| Arc::clone(entry.value()))
                .ok_or_else(|| AppError::SessionNotFound(id.to_string())),
            None => {
                if self.strict_sessions {
                    return Err(AppError::Validation {
                        field: "session_id".to_string(),
                        reason: "session_id is required in strict mode".to_string(),
                    });
                }

                let entry = self
                    .sessions
                    .entry(SessionId::default_session())
                    .or_insert_with(|| {
                        info!("Creating fallback 'default' session (no session_id supplied)");
                        Arc::new(RwLock::new(Session::new(
                            SessionId::default_session(),
                            self.context_config.clone(),
                            Arc::clone(&self.extractor),
                        )))
                    });
                Ok(Arc::clone(entry.value()))
            }
        }
    }

    /// Route one classified message into its session.
    ///
    /// Every message lands in the Turn tier; Core and Evolving
    /// classifications additionally store the message in that tier with
    /// extracted keywords. Returns the outcome plus a snapshot for flushing.
    pub fn submit(
        &self,
        id: Option<&SessionId>,
        role: Role,
        text: &str,
        tier: ContextTier,
    ) -> Result<(SubmitOutcome, Snapshot)> {
        let session = self.resolve(id)?;
        let mut guard = session.write();
        guard.ensure_active()?;

        guard.store.add_turn(role, text)?;
        let keywords = match tier {
            ContextTier::Core => guard.store.add_core(text)?,
            ContextTier::Evolving => guard.store.add_evolving(text)?,
            ContextTier::Turn => Vec::new(),
        };

        guard.meta.touch();
        let outcome = SubmitOutcome {
            session_id: guard.meta.id.clone(),
            tier,
            keywords,
        };
        let snapshot = guard.snapshot();
        Ok((outcome, snapshot))
    }

    /// Deterministic summary of a session's context
    pub fn summary(&self, id: &SessionId) -> Result<ContextSummary> {
        let session = self.resolve(Some(id))?;
        let guard = session.read();
        Ok(guard.store.summary())
    }

    /// Freeze a session. It stays readable until explicitly deleted.
    pub fn end_session(&self, id: &SessionId) -> Result<Snapshot> {
        let session = self.resolve(Some(id))?;
        let mut guard = session.write();
        guard.meta.status = SessionStatus::Ended;
        guard.meta.touch();

        info!(session_id = %id, "Session ended");
        Ok(guard.snapshot())
    }

    /// Empty a session's tiers and reset its corpus. Allowed on ended
    /// sessions: clearing is part of explicit teardown, not a mutation of
    /// tracked context.
    pub fn clear(&self, id: &SessionId) -> Result<Snapshot> {
        let session = self.resolve(Some(id))?;
        let mut guard = session.write();
        guard.store.clear();
        guard.meta.touch();

        info!(session_id = %id, "Session context cleared");
        Ok(guard.snapshot())
    }

    /// Export a session's full state
    pub fn export_context(&self, id: &SessionId) -> Result<Snapshot> {
        let session = self.resolve(Some(id))?;
        let guard = session.read();
        Ok(guard.snapshot())
    }

    /// Import a snapshot into an existing session. The target keeps its own
    /// identity; tiers and corpus are replaced wholesale. Exclusive with any
    /// concurrent `add_*` by the session's write lock.
    pub fn import_context(&self, id: &SessionId, snapshot: Snapshot) -> Result<Snapshot> {
        let session = self.resolve(Some(id))?;
        let mut guard = session.write();
        guard.ensure_active()?;

        guard.store.import(snapshot)?;
        guard.meta.touch();

        info!(session_id = %id, "Snapshot imported");
        Ok(guard.snapshot())
    }

    /// Remove a session entirely. The caller is responsible for removing the
    /// durable record as well.
    pub fn delete(&self, id: &SessionId) -> Result<()> {
        self.sessions
            .remove(id)
            .map(|_| info!(session_id = %id, "Session deleted"))
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Metadata for all sessions, most-recently-active first
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|entry| {
                let guard = entry.value().read();
                SessionSummary {
                    id: guard.meta.id.clone(),
                    status: guard.meta.status,
                    created_at: guard.meta.created_at,
                    last_active_at: guard.meta.last_active_at,
                    turn_count: guard.store.turn_count(),
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        summaries
    }

    /// Per-session statistics
    pub fn stats(&self, id: &SessionId) -> Result<SessionStats> {
        let session = self.resolve(Some(id))?;
        let guard = session.read();
        let (total_keywords, avg_keyword_weight) = guard.store.keyword_stats();

        Ok(SessionStats {
            session_id: guard.meta.id.clone(),
            status: guard.meta.status,
            core_count: guard.store.core_count(),
            evolving_count: guard.store.evolving_count(),
            turn_count: guard.store.turn_count(),
            active_constraints: guard.store.evolving_count(),
            total_keywords,
            avg_keyword_weight,
            corpus_documents: guard.store.corpus().total_documents,
            corpus_unique_terms: guard.store.corpus().unique_terms(),
        })
    }

    /// Record that a session's state reached durable storage
    pub fn mark_flushed(&self, id: &SessionId, at: chrono::DateTime<Utc>) {
        if let Some(entry) = self.sessions.get(id) {
            entry.value().write().meta.last_flushed_at = Some(at);
        }
    }

    /// Snapshot every session (shutdown flush-all path)
    pub fn all_snapshots(&self) -> Vec<Snapshot> {
        self.sessions
            .iter()
            .map(|entry| entry.value().read().snapshot())
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registry() -> SessionRegistry {
        SessionRegistry::new(ContextConfig::default(), false)
    }

    #[test]
    fn test_start_session_yields_distinct_ids() {
        let registry = test_registry();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..50 {
            assert!(ids.insert(registry.start_session()));
        }
        assert_eq!(registry.session_count(), 50);
    }

    #[test]
    fn test_unknown_id_is_never_created() {
        let registry = test_registry();
        let ghost = SessionId("nosuchsession".to_string());

        let err = registry.resolve(Some(&ghost)).unwrap_err();
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn test_end_session_unknown_id() {
        let registry = test_registry();
        let err = registry
            .end_session(&SessionId("missing".to_string()))
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
    }

    #[test]
    fn test_default_fallback_session() {
        let registry = test_registry();
        let (outcome, _) = registry
            .submit(None, Role::User, "hello there", ContextTier::Turn)
            .unwrap();

        assert_eq!(outcome.session_id, SessionId::default_session());
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn test_strict_mode_rejects_missing_id() {
        let registry = SessionRegistry::new(ContextConfig::default(), true);
        let err = registry
            .submit(None, Role::User, "hello", ContextTier::Turn)
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn test_ended_session_is_frozen_but_readable() {
        let registry = test_registry();
        let id = registry.start_session();
        registry
            .submit(Some(&id), Role::User, "the problem statement", ContextTier::Core)
            .unwrap();
        registry.end_session(&id).unwrap();

        let err = registry
            .submit(Some(&id), Role::User, "more input", ContextTier::Turn)
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_ENDED");

        // Still readable
        let summary = registry.summary(&id).unwrap();
        assert_eq!(summary.core_problems.len(), 1);
        let stats = registry.stats(&id).unwrap();
        assert_eq!(stats.status, SessionStatus::Ended);
    }

    #[test]
    fn test_submit_core_also_records_turn() {
        let registry = test_registry();
        let id = registry.start_session();
        registry
            .submit(Some(&id), Role::User, "design the ingestion pipeline", ContextTier::Core)
            .unwrap();

        let stats = registry.stats(&id).unwrap();
        assert_eq!(stats.core_count, 1);
        assert_eq!(stats.turn_count, 1);
    }

    #[test]
    fn test_clear_then_summary_is_empty() {
        let registry = test_registry();
        let id = registry.start_session();
        registry
            .submit(Some(&id), Role::User, "some tracked problem", ContextTier::Core)
            .unwrap();

        registry.clear(&id).unwrap();
        assert!(registry.summary(&id).unwrap().is_empty());
    }

    #[test]
    fn test_list_sessions_most_recent_first() {
        let registry = test_registry();
        let first = registry.start_session();
        let second = registry.start_session();

        // Touch the first session so it becomes the most recent
        registry
            .submit(Some(&first), Role::User, "touch", ContextTier::Turn)
            .unwrap();

        let listed = registry.list_sessions();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[1].id, second);
    }

    #[test]
    fn test_export_import_into_new_session() {
        let registry = test_registry();
        let source = registry.start_session();
        registry
            .submit(Some(&source), Role::User, "migrate the billing system", ContextTier::Core)
            .unwrap();
        registry
            .submit(Some(&source), Role::User, "keep downtime under one hour", ContextTier::Evolving)
            .unwrap();

        let snapshot = registry.export_context(&source).unwrap();

        let target = registry.start_session();
        registry.import_context(&target, snapshot).unwrap();

        assert_eq!(
            registry.summary(&source).unwrap(),
            registry.summary(&target).unwrap()
        );
    }

    #[test]
    fn test_delete_removes_session() {
        let registry = test_registry();
        let id = registry.start_session();
        registry.delete(&id).unwrap();

        assert_eq!(registry.session_count(), 0);
        assert!(registry.resolve(Some(&id)).is_err());
        assert!(registry.delete(&id).is_err());
    }
}
