//! Statistical keyword extraction
//!
//! TF-IDF scoring over a per-session corpus:
//! - Tokenizer that handles mixed Latin / Japanese text
//! - Term frequency from the current document
//! - Inverse document frequency from the session's accumulated corpus
//!
//! Extraction never fails; text with no scoreable tokens simply yields an
//! empty result and leaves the corpus untouched.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::constants::MIN_TOKEN_LENGTH;

/// English stop words
const STOP_WORDS_EN: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "been", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "can", "this", "that", "these",
    "those", "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my",
    "your", "his", "its", "our", "their",
];

/// Japanese stop words (particles, auxiliaries, and filler phrases)
const STOP_WORDS_JA: &[&str] = &[
    "の", "に", "は", "を", "た", "が", "で", "て", "と", "し", "れ", "さ", "ある", "いる", "も",
    "する", "から", "な", "こと", "として", "い", "や", "れる", "など", "なっ", "ない", "この",
    "ため", "その", "あっ", "よう", "また", "もの", "という", "あり", "まで", "られ", "なる",
    "へ", "か", "だ", "これ", "によって", "により", "おり", "より", "による", "ず", "なり",
    "られる", "において", "ば", "なかっ", "なく", "しかし", "について", "せ", "だっ", "その他",
    "ここ", "そこ", "それ", "どこ", "いつ", "なぜ", "どう", "どの", "どんな", "です", "ます",
    "である", "でした", "だった", "ください", "ちょっと", "ちゃん", "さん", "くん", "みたい",
    "みたいな", "っぽい", "感じ", "ような", "けど", "でも", "ただし",
];

/// A ranked keyword with its TF-IDF weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    /// Normalized term
    pub term: String,

    /// TF-IDF weight at the time the term was scored
    pub weight: f32,
}

/// Rarity statistics accumulated from every document scored in a session
///
/// `total_documents` counts exactly the documents that produced at least one
/// token; fully-filtered documents (stop words only, punctuation only) are
/// never counted, so they cannot skew IDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    /// term → number of documents containing the term
    pub document_frequency: HashMap<String, u32>,

    /// Number of non-empty documents ever scored
    pub total_documents: u64,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inverse document frequency: `ln(total / max(df, 1))`
    ///
    /// Returns 0.0 on an empty corpus so that first-document scoring is
    /// well-defined instead of dividing by zero.
    pub fn idf(&self, term: &str) -> f32 {
        if self.total_documents == 0 {
            return 0.0;
        }

        let doc_freq = self.document_frequency.get(term).copied().unwrap_or(0).max(1);
        ((self.total_documents as f32) / (doc_freq as f32)).ln()
    }

    /// Fold one scored document's distinct terms into the statistics
    fn record_document<'a>(&mut self, distinct_terms: impl Iterator<Item = &'a str>) {
        self.total_documents += 1;
        for term in distinct_terms {
            *self.document_frequency.entry(term.to_string()).or_insert(0) += 1;
        }
    }

    /// Number of distinct terms ever observed
    pub fn unique_terms(&self) -> usize {
        self.document_frequency.len()
    }

    /// True when every per-term count is possible given `total_documents`.
    /// Used to reject hand-edited or corrupted snapshots at import.
    pub fn is_consistent(&self) -> bool {
        self.document_frequency
            .values()
            .all(|&df| u64::from(df) <= self.total_documents)
    }

    /// Drop all accumulated statistics
    pub fn reset(&mut self) {
        self.document_frequency.clear();
        self.total_documents = 0;
    }
}

/// Character classes the tokenizer splits on.
///
/// Latin and CJK runs are independent token classes: "rust実装" tokenizes as
/// ["rust", "実装"], not as one mixed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Latin,
    Cjk,
}

fn classify(c: char) -> Option<TokenClass> {
    if c.is_ascii_alphabetic() {
        return Some(TokenClass::Latin);
    }

    // Hiragana, katakana, CJK unified ideographs
    match c {
        '\u{3040}'..='\u{309f}' | '\u{30a0}'..='\u{30ff}' | '\u{4e00}'..='\u{9fff}' => {
            Some(TokenClass::Cjk)
        }
        _ => None,
    }
}

/// Tokenizer + TF-IDF scorer
///
/// Holds only the stop-word set; all rarity state lives in the per-session
/// [`Corpus`], so one extractor instance is safely shared across sessions.
#[derive(Debug)]
pub struct KeywordExtractor {
    stop_words: HashSet<&'static str>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        let stop_words = STOP_WORDS_EN
            .iter()
            .chain(STOP_WORDS_JA.iter())
            .copied()
            .collect();
        Self { stop_words }
    }

    /// Split text into normalized tokens.
    ///
    /// Latin runs are case-folded; anything that is neither Latin nor CJK
    /// (punctuation, digits, emoji) is silently dropped. Tokens shorter than
    /// [`MIN_TOKEN_LENGTH`] or found in the stop-word set are removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut current_class: Option<TokenClass> = None;

        let flush = |buf: &mut String, tokens: &mut Vec<String>| {
            if !buf.is_empty() {
                tokens.push(std::mem::take(buf));
            }
        };

        for c in text.chars() {
            match classify(c) {
                Some(class) => {
                    if current_class != Some(class) {
                        flush(&mut current, &mut tokens);
                        current_class = Some(class);
                    }
                    if class == TokenClass::Latin {
                        current.push(c.to_ascii_lowercase());
                    } else {
                        current.push(c);
                    }
                }
                None => {
                    flush(&mut current, &mut tokens);
                    current_class = None;
                }
            }
        }
        flush(&mut current, &mut tokens);

        tokens
            .into_iter()
            .filter(|t| t.chars().count() >= MIN_TOKEN_LENGTH)
            .filter(|t| !self.stop_words.contains(t.as_str()))
            .collect()
    }

    /// Term frequency: count(term) / len(tokens)
    fn term_frequency(tokens: &[String]) -> HashMap<&str, f32> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in tokens {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let total = tokens.len() as f32;
        counts
            .into_iter()
            .map(|(term, count)| (term, count as f32 / total))
            .collect()
    }

    /// Extract the `top_k` highest-scoring terms from `text`.
    ///
    /// Scoring uses the corpus as it stands *before* this document; only
    /// after ranking does the document update `document_frequency` and
    /// `total_documents`. Ties are broken by first occurrence in the text,
    /// which keeps the result deterministic even on a cold corpus where
    /// every IDF is zero.
    pub fn extract_keywords(
        &self,
        corpus: &mut Corpus,
        text: &str,
        top_k: usize,
    ) -> Vec<KeywordEntry> {
        let tokens = self.tokenize(text);
        if tokens.is_empty() {
            return Vec::new();
        }

        // First-occurrence rank of each distinct term, for tie-breaking
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (idx, token) in tokens.iter().enumerate() {
            first_seen.entry(token.as_str()).or_insert(idx);
        }

        let tf = Self::term_frequency(&tokens);

        let mut scored: Vec<(&str, f32, usize)> = tf
            .into_iter()
            .map(|(term, tf_score)| {
                let score = tf_score * corpus.idf(term);
                (term, score, first_seen[term])
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.2.cmp(&b.2))
        });
        scored.truncate(top_k);

        let result: Vec<KeywordEntry> = scored
            .into_iter()
            .map(|(term, weight, _)| KeywordEntry {
                term: term.to_string(),
                weight,
            })
            .collect();

        // The document joins the corpus only after it has been scored
        corpus.record_document(first_seen.keys().copied());

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_symbols() {
        let extractor = KeywordExtractor::new();
        let tokens = extractor.tokenize("The budget is 50000, and the deadline!!");

        assert_eq!(tokens, vec!["budget", "deadline"]);
    }

    #[test]
    fn test_tokenize_splits_latin_and_cjk_runs() {
        let extractor = KeywordExtractor::new();

        // Class change splits; adjacent kana/ideographs stay one run
        assert_eq!(extractor.tokenize("rust実装"), vec!["rust", "実装"]);
        assert_eq!(
            extractor.tokenize("キャッシュ戦略とRust"),
            vec!["キャッシュ戦略と", "rust"]
        );
    }

    #[test]
    fn test_tokenize_case_folds_latin() {
        let extractor = KeywordExtractor::new();
        let tokens = extractor.tokenize("Tokyo TOKYO tokyo");

        assert_eq!(tokens, vec!["tokyo", "tokyo", "tokyo"]);
    }

    #[test]
    fn test_tokenize_min_length() {
        let extractor = KeywordExtractor::new();
        // "x" and "y" are below the minimum token length
        let tokens = extractor.tokenize("x y rust");

        assert_eq!(tokens, vec!["rust"]);
    }

    #[test]
    fn test_extract_on_empty_corpus_is_deterministic() {
        let extractor = KeywordExtractor::new();
        let mut corpus = Corpus::new();

        let keywords =
            extractor.extract_keywords(&mut corpus, "budget is 50000 and deadline is two months", 3);

        // All IDFs are zero on a cold corpus; order falls back to first
        // occurrence in the text.
        let terms: Vec<&str> = keywords.iter().map(|k| k.term.as_str()).collect();
        assert_eq!(terms, vec!["budget", "deadline", "two"]);
    }

    #[test]
    fn test_empty_document_does_not_touch_corpus() {
        let extractor = KeywordExtractor::new();
        let mut corpus = Corpus::new();

        let keywords = extractor.extract_keywords(&mut corpus, "the and is !!! 123", 5);

        assert!(keywords.is_empty());
        assert_eq!(corpus.total_documents, 0);
        assert_eq!(corpus.unique_terms(), 0);
    }

    #[test]
    fn test_corpus_counts_distinct_terms_once() {
        let extractor = KeywordExtractor::new();
        let mut corpus = Corpus::new();

        extractor.extract_keywords(&mut corpus, "cache cache cache invalidation", 5);

        assert_eq!(corpus.total_documents, 1);
        assert_eq!(corpus.document_frequency.get("cache"), Some(&1));
        assert_eq!(corpus.document_frequency.get("invalidation"), Some(&1));
    }

    #[test]
    fn test_idf_decays_as_term_spreads() {
        let extractor = KeywordExtractor::new();
        let mut corpus = Corpus::new();

        extractor.extract_keywords(&mut corpus, "database latency spike", 5);
        extractor.extract_keywords(&mut corpus, "frontend render jitter", 5);

        // "database" appears in 1 of 2 documents
        let before = corpus.idf("database");
        extractor.extract_keywords(&mut corpus, "database migration plan", 5);
        // now 2 of 3
        let after = corpus.idf("database");

        assert!(before > 0.0);
        assert!(after < before);
    }

    #[test]
    fn test_repeat_extraction_never_scores_higher() {
        let extractor = KeywordExtractor::new();
        let mut corpus = Corpus::new();

        let first = extractor.extract_keywords(&mut corpus, "kubernetes rollout stuck", 3);
        let second = extractor.extract_keywords(&mut corpus, "kubernetes rollout stuck", 3);

        for entry in &second {
            if let Some(prev) = first.iter().find(|e| e.term == entry.term) {
                assert!(entry.weight <= prev.weight);
            }
        }
    }

    #[test]
    fn test_corpus_consistency() {
        let mut corpus = Corpus::new();
        assert!(corpus.is_consistent());

        corpus.document_frequency.insert("ghost".to_string(), 3);
        // df=3 with zero documents is impossible
        assert!(!corpus.is_consistent());
    }
}
