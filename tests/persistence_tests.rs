//! Durability tests: flush-after-mutation, restart recovery, and record
//! lifecycle, exercised through the full service wiring.

use std::fs;

use tempfile::TempDir;

use strata_memory::config::ServerConfig;
use strata_memory::handlers::ContextService;
use strata_memory::memory::{ContextTier, Role, SessionId};

fn test_config(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        storage_path: dir.path().to_path_buf(),
        ..Default::default()
    }
}

fn new_service(dir: &TempDir) -> ContextService {
    ContextService::new(&test_config(dir)).expect("service should build")
}

#[test]
fn sessions_survive_restart() {
    let dir = TempDir::new().unwrap();
    let session_id;

    // Phase 1: create state and drop the service
    {
        let service = new_service(&dir);
        session_id = service.start_session();
        service
            .submit(
                Some(&session_id),
                Role::User,
                "persist the conversation state",
                ContextTier::Core,
            )
            .unwrap();
        service
            .submit(
                Some(&session_id),
                Role::Assistant,
                "writing it down",
                ContextTier::Turn,
            )
            .unwrap();
    }
    // Service dropped here - simulates restart

    // Phase 2: a fresh service reconstructs the registry from disk
    {
        let service = new_service(&dir);
        let restored = service.load_persisted();
        assert_eq!(restored, 1);

        let summary = service.summary(&session_id).unwrap();
        assert_eq!(
            summary.core_problems,
            vec!["persist the conversation state"]
        );
        assert_eq!(summary.recent_turns.len(), 2);

        let stats = service.stats(&session_id).unwrap();
        assert_eq!(stats.corpus_documents, 1);
    }
}

#[test]
fn summary_identical_across_restart() {
    let dir = TempDir::new().unwrap();
    let session_id;
    let before;

    {
        let service = new_service(&dir);
        session_id = service.start_session();
        service
            .submit(Some(&session_id), Role::User, "tune the query planner", ContextTier::Core)
            .unwrap();
        service
            .submit(
                Some(&session_id),
                Role::User,
                "memory budget stays under one gigabyte",
                ContextTier::Evolving,
            )
            .unwrap();
        before = service.summary(&session_id).unwrap();
    }

    let service = new_service(&dir);
    service.load_persisted();
    let after = service.summary(&session_id).unwrap();

    assert_eq!(before, after);
}

#[test]
fn corrupt_record_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let good_id;

    {
        let service = new_service(&dir);
        good_id = service.start_session();
        service
            .submit(Some(&good_id), Role::User, "the good session", ContextTier::Turn)
            .unwrap();
    }

    // Plant a record no parser will accept
    fs::write(dir.path().join("mangled.json"), b"\x00\x01 not json at all").unwrap();

    let service = new_service(&dir);
    let restored = service.load_persisted();

    assert_eq!(restored, 1);
    assert!(service.summary(&good_id).is_ok());
}

#[test]
fn delete_session_removes_durable_record() {
    let dir = TempDir::new().unwrap();
    let service = new_service(&dir);

    let id = service.start_session();
    service
        .submit(Some(&id), Role::User, "short-lived", ContextTier::Turn)
        .unwrap();
    assert!(dir.path().join(format!("{id}.json")).exists());

    service.delete_session(&id).unwrap();
    assert!(!dir.path().join(format!("{id}.json")).exists());

    // Gone from the registry too
    assert!(service.summary(&id).is_err());
}

#[test]
fn ended_sessions_are_restored_frozen() {
    let dir = TempDir::new().unwrap();
    let session_id;

    {
        let service = new_service(&dir);
        session_id = service.start_session();
        service
            .submit(Some(&session_id), Role::User, "wrap this up", ContextTier::Turn)
            .unwrap();
        service.end_session(&session_id).unwrap();
    }

    let service = new_service(&dir);
    service.load_persisted();

    let err = service
        .submit(Some(&session_id), Role::User, "postscript", ContextTier::Turn)
        .unwrap_err();
    assert_eq!(err.code(), "SESSION_ENDED");
}

#[test]
fn no_scratch_files_left_after_flushes() {
    let dir = TempDir::new().unwrap();
    let service = new_service(&dir);

    let id = service.start_session();
    for i in 0..10 {
        service
            .submit(Some(&id), Role::User, &format!("turn {i}"), ContextTier::Turn)
            .unwrap();
    }

    let leftovers: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "scratch files left behind: {leftovers:?}");
}

#[test]
fn flush_all_persists_every_live_session() {
    let dir = TempDir::new().unwrap();
    let ids: Vec<SessionId>;

    {
        let service = new_service(&dir);
        ids = (0..3).map(|_| service.start_session()).collect();
        let flushed = service.flush_all();
        assert_eq!(flushed, 3);
    }

    let service = new_service(&dir);
    assert_eq!(service.load_persisted(), 3);
    for id in &ids {
        assert!(service.stats(id).is_ok());
    }
}
