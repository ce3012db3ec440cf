//! Hierarchical context store
//!
//! One instance per session, three bounded tiers:
//! - Core: verbatim problem statements with cached keywords
//! - Evolving: constraints and refinements with cached keywords, FIFO
//! - Turn: raw conversation history, FIFO, no extraction
//!
//! All eviction is oldest-first and happens inside the same call that grew
//! the tier, so the bounds hold after every mutation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;

use super::types::*;
use super::ContextConfig;
use crate::constants::EVOLVING_SUMMARY_KEYWORDS;
use crate::errors::{AppError, Result};
use crate::keywords::{Corpus, KeywordEntry, KeywordExtractor};

#[derive(Debug)]
pub struct HierarchicalContextStore {
    config: ContextConfig,
    extractor: Arc<KeywordExtractor>,

    core: VecDeque<CoreEntry>,
    evolving: VecDeque<EvolvingEntry>,
    turn: VecDeque<TurnEntry>,

    /// Rarity statistics, scoped to this session
    corpus: Corpus,
}

impl HierarchicalContextStore {
    pub fn new(config: ContextConfig, extractor: Arc<KeywordExtractor>) -> Self {
        Self {
            config,
            extractor,
            core: VecDeque::new(),
            evolving: VecDeque::new(),
            turn: VecDeque::new(),
            corpus: Corpus::new(),
        }
    }

    /// Track a new problem statement. Evicts the oldest statement when the
    /// tier is full. Returns the keywords cached for the entry.
    pub fn add_core(&mut self, text: &str) -> Result<Vec<KeywordEntry>> {
        let keywords =
            self.extractor
                .extract_keywords(&mut self.corpus, text, self.config.keyword_top_k);

        self.core.push_back(CoreEntry {
            text: text.to_string(),
            timestamp: Utc::now(),
            keywords: keywords.clone(),
        });
        while self.core.len() > self.config.max_core_contexts {
            self.core.pop_front();
        }

        self.check_invariants()?;
        Ok(keywords)
    }

    /// Track a constraint or refinement. FIFO eviction on overflow.
    pub fn add_evolving(&mut self, text: &str) -> Result<Vec<KeywordEntry>> {
        let keywords =
            self.extractor
                .extract_keywords(&mut self.corpus, text, self.config.keyword_top_k);

        self.evolving.push_back(EvolvingEntry {
            text: text.to_string(),
            timestamp: Utc::now(),
            keywords: keywords.clone(),
        });
        while self.evolving.len() > self.config.max_evolving_items {
            self.evolving.pop_front();
        }

        self.check_invariants()?;
        Ok(keywords)
    }

    /// Record a verbatim conversation turn. No keyword extraction.
    pub fn add_turn(&mut self, role: Role, text: &str) -> Result<()> {
        self.turn.push_back(TurnEntry {
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
        while self.turn.len() > self.config.turn_history_limit {
            self.turn.pop_front();
        }

        self.check_invariants()
    }

    /// Assemble the summary from cached state. Performs no extraction work.
    pub fn summary(&self) -> ContextSummary {
        // Merge Evolving keywords, keeping the highest weight per term
        let mut merged: HashMap<&str, f32> = HashMap::new();
        for entry in &self.evolving {
            for kw in &entry.keywords {
                merged
                    .entry(kw.term.as_str())
                    .and_modify(|w| *w = w.max(kw.weight))
                    .or_insert(kw.weight);
            }
        }

        let mut evolving_keywords: Vec<KeywordEntry> = merged
            .into_iter()
            .map(|(term, weight)| KeywordEntry {
                term: term.to_string(),
                weight,
            })
            .collect();
        // Weight descending, term ascending on ties: deterministic output
        evolving_keywords.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });
        evolving_keywords.truncate(EVOLVING_SUMMARY_KEYWORDS);

        ContextSummary {
            core_problems: self.core.iter().map(|e| e.text.clone()).collect(),
            evolving_keywords,
            recent_turns: self
                .turn
                .iter()
                .map(|t| TurnLine {
                    role: t.role,
                    text: t.text.clone(),
                })
                .collect(),
        }
    }

    /// Empty all tiers and reset the corpus. Irreversible.
    pub fn clear(&mut self) {
        self.core.clear();
        self.evolving.clear();
        self.turn.clear();
        self.corpus.reset();
    }

    /// Export full state as a snapshot
    pub fn export(&self, meta: &SessionMeta) -> Snapshot {
        Snapshot {
            schema_version: Snapshot::current_version(),
            session: meta.clone(),
            core: self.core.iter().cloned().collect(),
            evolving: self.evolving.iter().cloned().collect(),
            turn: self.turn.iter().cloned().collect(),
            corpus: self.corpus.clone(),
        }
    }

    /// Replace this store's state with a validated snapshot.
    ///
    /// The snapshot is checked in full before anything is applied; a
    /// malformed snapshot leaves the store untouched.
    pub fn import(&mut self, snapshot: Snapshot) -> Result<()> {
        if snapshot.schema_version != Snapshot::current_version() {
            return Err(AppError::VersionMismatch {
                expected: Snapshot::current_version(),
                found: snapshot.schema_version,
            });
        }

        let checks = [
            ("core", snapshot.core.len(), self.config.max_core_contexts),
            (
                "evolving",
                snapshot.evolving.len(),
                self.config.max_evolving_items,
            ),
            ("turn", snapshot.turn.len(), self.config.turn_history_limit),
        ];
        for (tier, len, limit) in checks {
            if len > limit {
                return Err(AppError::Validation {
                    field: format!("snapshot.{tier}"),
                    reason: format!("{len} entries exceeds the configured limit of {limit}"),
                });
            }
        }

        if !snapshot.corpus.is_consistent() {
            return Err(AppError::Validation {
                field: "snapshot.corpus".to_string(),
                reason: "document_frequency counts exceed total_documents".to_string(),
            });
        }

        self.core = snapshot.core.into();
        self.evolving = snapshot.evolving.into();
        self.turn = snapshot.turn.into();
        self.corpus = snapshot.corpus;

        self.check_invariants()
    }

    pub fn core_count(&self) -> usize {
        self.core.len()
    }

    pub fn evolving_count(&self) -> usize {
        self.evolving.len()
    }

    pub fn turn_count(&self) -> usize {
        self.turn.len()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Count and mean weight of all cached keywords across Core and Evolving
    pub fn keyword_stats(&self) -> (usize, f32) {
        let all = self
            .core
            .iter()
            .flat_map(|e| e.keywords.iter())
            .chain(self.evolving.iter().flat_map(|e| e.keywords.iter()));

        let mut count = 0usize;
        let mut total = 0f32;
        for kw in all {
            count += 1;
            total += kw.weight;
        }

        let avg = if count == 0 { 0.0 } else { total / count as f32 };
        (count, avg)
    }

    /// Verify the tier bounds. A violation is a programming fault, not a
    /// recoverable condition.
    fn check_invariants(&self) -> Result<()> {
        let checks = [
            ("core", self.core.len(), self.config.max_core_contexts),
            (
                "evolving",
                self.evolving.len(),
                self.config.max_evolving_items,
            ),
            ("turn", self.turn.len(), self.config.turn_history_limit),
        ];
        for (tier, len, limit) in checks {
            if len > limit {
                return Err(AppError::CapacityInvariant { tier, len, limit });
            }
        }
        Ok(())
    }
}
