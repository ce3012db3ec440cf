//! Tier bounding and eviction tests
//!
//! The bounds must hold after every mutation, eviction must be oldest-first,
//! and export/import must round-trip to an identical summary.

use std::sync::Arc;

use strata_memory::keywords::KeywordExtractor;
use strata_memory::memory::{
    ContextConfig, HierarchicalContextStore, Role, SessionId, SessionMeta,
};

fn new_store() -> HierarchicalContextStore {
    HierarchicalContextStore::new(ContextConfig::default(), Arc::new(KeywordExtractor::new()))
}

fn new_store_with(config: ContextConfig) -> HierarchicalContextStore {
    HierarchicalContextStore::new(config, Arc::new(KeywordExtractor::new()))
}

// ============================================================================
// TURN TIER
// ============================================================================

#[test]
fn turn_count_never_exceeds_limit() {
    let mut store = new_store();
    for i in 0..25 {
        store
            .add_turn(Role::User, &format!("turn message {i}"))
            .unwrap();
        assert!(store.turn_count() <= 6, "bound violated after add {i}");
    }
}

#[test]
fn turn_limit_six_with_ten_adds_keeps_exactly_six_most_recent() {
    let mut store = new_store();
    for i in 0..10 {
        store.add_turn(Role::User, &format!("message {i}")).unwrap();
    }

    assert_eq!(store.turn_count(), 6);

    let turns = store.summary().recent_turns;
    let expected: Vec<String> = (4..10).map(|i| format!("message {i}")).collect();
    let actual: Vec<String> = turns.into_iter().map(|t| t.text).collect();
    assert_eq!(actual, expected, "oldest-first order must be preserved");
}

#[test]
fn turn_roles_are_preserved_verbatim() {
    let mut store = new_store();
    store.add_turn(Role::User, "question?").unwrap();
    store.add_turn(Role::Assistant, "answer.").unwrap();
    store.add_turn(Role::System, "note").unwrap();

    let turns = store.summary().recent_turns;
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[2].role, Role::System);
}

#[test]
fn turn_tier_performs_no_extraction() {
    let mut store = new_store();
    store
        .add_turn(Role::User, "plenty of extractable vocabulary here")
        .unwrap();

    // The corpus only grows through Core/Evolving entries
    assert_eq!(store.corpus().total_documents, 0);
}

// ============================================================================
// EVOLVING TIER
// ============================================================================

#[test]
fn evolving_retains_exactly_most_recent_at_limit() {
    let mut store = new_store_with(ContextConfig {
        max_evolving_items: 10,
        ..Default::default()
    });

    for i in 0..10 {
        store.add_evolving(&format!("constraint item{i}")).unwrap();
    }
    assert_eq!(store.evolving_count(), 10);

    // One more evicts exactly the oldest
    store.add_evolving("constraint item10").unwrap();
    assert_eq!(store.evolving_count(), 10);
}

#[test]
fn evolving_eviction_is_fifo() {
    let mut store = new_store_with(ContextConfig {
        max_evolving_items: 3,
        keyword_top_k: 5,
        ..Default::default()
    });

    store.add_evolving("alpha constraint budget").unwrap();
    store.add_evolving("beta constraint deadline").unwrap();
    store.add_evolving("gamma constraint staffing").unwrap();
    store.add_evolving("delta constraint scope").unwrap();

    // "alpha" was evicted, so its keywords no longer contribute
    let summary = store.summary();
    assert!(summary
        .evolving_keywords
        .iter()
        .all(|kw| kw.term != "alpha"));
}

// ============================================================================
// CORE TIER
// ============================================================================

#[test]
fn core_bounded_at_three_with_oldest_evicted() {
    let mut store = new_store();
    for label in ["first", "second", "third", "fourth"] {
        store.add_core(&format!("{label} problem statement")).unwrap();
    }

    let problems = store.summary().core_problems;
    assert_eq!(problems.len(), 3);
    assert_eq!(problems[0], "second problem statement");
    assert_eq!(problems[2], "fourth problem statement");
}

// ============================================================================
// CLEAR AND ROUND-TRIP
// ============================================================================

#[test]
fn clear_empties_all_tiers_and_corpus() {
    let mut store = new_store();
    store.add_core("tracked problem").unwrap();
    store.add_evolving("tracked constraint").unwrap();
    store.add_turn(Role::User, "tracked turn").unwrap();

    store.clear();

    let summary = store.summary();
    assert!(summary.core_problems.is_empty());
    assert!(summary.evolving_keywords.is_empty());
    assert!(summary.recent_turns.is_empty());
    assert_eq!(store.corpus().total_documents, 0);
}

#[test]
fn export_import_reproduces_identical_summary() {
    let mut store = new_store();
    store.add_core("rewrite the ingestion service in stages").unwrap();
    store.add_evolving("zero downtime during cutover").unwrap();
    store.add_evolving("reuse the existing schema registry").unwrap();
    store.add_turn(Role::User, "what about the backfill?").unwrap();
    store.add_turn(Role::Assistant, "runs as a separate job").unwrap();

    let snapshot = store.export(&SessionMeta::new(SessionId::generate()));

    let mut fresh = new_store();
    fresh.import(snapshot).unwrap();

    assert_eq!(store.summary(), fresh.summary());
}

#[test]
fn import_failure_leaves_target_untouched() {
    let mut source = new_store();
    source.add_core("exported state").unwrap();
    let mut snapshot = source.export(&SessionMeta::new(SessionId::generate()));
    snapshot.schema_version = 42;

    let mut target = new_store();
    target.add_core("existing state").unwrap();

    assert!(target.import(snapshot).is_err());
    assert_eq!(target.summary().core_problems, vec!["existing state"]);
}
