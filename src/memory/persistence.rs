//! Durable session storage
//!
//! One JSON record per session, named by session id. A flush writes the
//! record to a scratch file in the same directory, fsyncs it, and renames it
//! into place; a crash mid-write can only ever leave the scratch file
//! behind, never a corrupt record.
//!
//! Durability failures are deliberately non-fatal: a failed flush is retried
//! once and then logged as a warning. In-memory state stays authoritative
//! and the next successful flush restores durability.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyResult};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::types::{SessionId, Snapshot};
use crate::constants::{RECORD_EXTENSION, RECORD_TMP_SUFFIX, SNAPSHOT_SCHEMA_VERSION};

pub struct PersistenceManager {
    root: PathBuf,
}

impl PersistenceManager {
    /// Open (and create if needed) the storage directory
    pub fn new(root: impl Into<PathBuf>) -> AnyResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create storage directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &SessionId) -> PathBuf {
        self.root.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    /// Write a session's durable record.
    ///
    /// Stamps `last_flushed_at`, retries a failed write once, and never
    /// fails the caller: on double failure the warning is logged and `None`
    /// is returned.
    pub fn flush(&self, snapshot: &Snapshot) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        let mut record = snapshot.clone();
        record.session.last_flushed_at = Some(now);

        match self.try_write(&record) {
            Ok(()) => {
                debug!(session_id = %record.session.id, "Session flushed");
                Some(now)
            }
            Err(first) => {
                warn!(
                    session_id = %record.session.id,
                    error = %first,
                    "Flush failed, retrying once"
                );
                match self.try_write(&record) {
                    Ok(()) => Some(now),
                    Err(second) => {
                        warn!(
                            session_id = %record.session.id,
                            error = %second,
                            "Flush retry failed; in-memory state remains authoritative"
                        );
                        None
                    }
                }
            }
        }
    }

    /// Scratch write + fsync + atomic rename
    fn try_write(&self, record: &Snapshot) -> AnyResult<()> {
        let final_path = self.record_path(&record.session.id);
        let tmp_path = final_path.with_extension(format!("{RECORD_EXTENSION}.{RECORD_TMP_SUFFIX}"));

        let json = serde_json::to_vec_pretty(record).context("failed to serialize snapshot")?;

        {
            let mut file = fs::File::create(&tmp_path)
                .with_context(|| format!("failed to create {}", tmp_path.display()))?;
            file.write_all(&json)?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("failed to rename into {}", final_path.display()))?;
        Ok(())
    }

    /// Load every durable record at startup.
    ///
    /// A record that fails to parse, or that carries an unknown schema
    /// version, is skipped with a warning rather than failing the whole
    /// startup.
    pub fn load_all(&self) -> Vec<Snapshot> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "Cannot read storage directory");
                return Vec::new();
            }
        };

        let mut snapshots = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }

            match self.read_record(&path) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable session record"
                    );
                }
            }
        }

        info!(count = snapshots.len(), "Durable session records loaded");
        snapshots
    }

    fn read_record(&self, path: &Path) -> AnyResult<Snapshot> {
        let bytes = fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes).context("malformed record")?;

        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            anyhow::bail!(
                "unsupported schema version {} (expected {})",
                snapshot.schema_version,
                SNAPSHOT_SCHEMA_VERSION
            );
        }
        Ok(snapshot)
    }

    /// Remove a session's durable record. Missing records are not an error.
    pub fn delete(&self, id: &SessionId) -> AnyResult<()> {
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(session_id = %id, "Durable record deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }
}
