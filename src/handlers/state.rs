//! Service state shared by all handlers
//!
//! `ContextService` wires the session registry to the persistence manager:
//! every mutation captures a snapshot inside the session's critical section
//! and flushes it once the lock has been released, so the durable copy never
//! sees a half-mutated state.

use std::sync::Arc;

use anyhow::Result as AnyResult;
use tracing::warn;

use crate::config::ServerConfig;
use crate::errors::{AppError, Result};
use crate::memory::{
    ContextSummary, ContextTier, PersistenceManager, Role, SessionId, SessionRegistry,
    SessionStats, SessionSummary, Snapshot, SubmitOutcome,
};

/// Application state type alias
pub type AppState = Arc<ContextService>;

pub struct ContextService {
    registry: SessionRegistry,
    persistence: PersistenceManager,
}

impl ContextService {
    pub fn new(config: &ServerConfig) -> AnyResult<Self> {
        Ok(Self {
            registry: SessionRegistry::new(config.context.clone(), config.strict_sessions),
            persistence: PersistenceManager::new(config.storage_path.clone())?,
        })
    }

    /// Rebuild the registry from durable records. Returns the number of
    /// sessions restored; unreadable records were already skipped by the
    /// persistence layer.
    pub fn load_persisted(&self) -> usize {
        let mut restored = 0;
        for snapshot in self.persistence.load_all() {
            let id = snapshot.session.id.clone();
            match self.registry.restore_session(snapshot) {
                Ok(_) => restored += 1,
                Err(e) => warn!(session_id = %id, error = %e, "Skipping invalid session record"),
            }
        }
        restored
    }

    /// Flush a snapshot captured after a completed mutation
    fn flush_after(&self, snapshot: Snapshot) {
        let id = snapshot.session.id.clone();
        if let Some(flushed_at) = self.persistence.flush(&snapshot) {
            self.registry.mark_flushed(&id, flushed_at);
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    pub fn start_session(&self) -> SessionId {
        let id = self.registry.start_session();
        if let Ok(snapshot) = self.registry.export_context(&id) {
            self.flush_after(snapshot);
        }
        id
    }

    pub fn end_session(&self, id: &SessionId) -> Result<()> {
        let snapshot = self.registry.end_session(id)?;
        self.flush_after(snapshot);
        Ok(())
    }

    /// Destroy a session and its durable record
    pub fn delete_session(&self, id: &SessionId) -> Result<()> {
        self.registry.delete(id)?;
        self.persistence.delete(id).map_err(AppError::Internal)?;
        Ok(())
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.registry.list_sessions()
    }

    pub fn stats(&self, id: &SessionId) -> Result<SessionStats> {
        self.registry.stats(id)
    }

    pub fn session_count(&self) -> usize {
        self.registry.session_count()
    }

    // =========================================================================
    // Context operations
    // =========================================================================

    pub fn submit(
        &self,
        id: Option<&SessionId>,
        role: Role,
        text: &str,
        tier: ContextTier,
    ) -> Result<SubmitOutcome> {
        let (outcome, snapshot) = self.registry.submit(id, role, text, tier)?;
        self.flush_after(snapshot);
        Ok(outcome)
    }

    pub fn summary(&self, id: &SessionId) -> Result<ContextSummary> {
        self.registry.summary(id)
    }

    pub fn clear(&self, id: &SessionId) -> Result<()> {
        let snapshot = self.registry.clear(id)?;
        self.flush_after(snapshot);
        Ok(())
    }

    pub fn export_context(&self, id: &SessionId) -> Result<Snapshot> {
        self.registry.export_context(id)
    }

    pub fn import_context(&self, id: &SessionId, snapshot: Snapshot) -> Result<ImportInfo> {
        let applied = self.registry.import_context(id, snapshot)?;
        let info = ImportInfo {
            core_count: applied.core.len(),
            evolving_count: applied.evolving.len(),
            turn_count: applied.turn.len(),
        };
        self.flush_after(applied);
        Ok(info)
    }

    /// Flush every live session (shutdown path). Returns how many snapshots
    /// reached durable storage.
    pub fn flush_all(&self) -> usize {
        let mut flushed = 0;
        for snapshot in self.registry.all_snapshots() {
            let id = snapshot.session.id.clone();
            if let Some(flushed_at) = self.persistence.flush(&snapshot) {
                self.registry.mark_flushed(&id, flushed_at);
                flushed += 1;
            }
        }
        flushed
    }
}

/// Tier counts applied by an import
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportInfo {
    pub core_count: usize,
    pub evolving_count: usize,
    pub turn_count: usize,
}
