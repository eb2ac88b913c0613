//! Categorizer — maps free-text input to topic categories.
//!
//! Two passes over the input:
//! 1. Keyword matching against every stored category. Single-word
//!    keywords match as whole tokens only ("QA" never matches
//!    "quality"); multi-word keywords match as a substring of the
//!    case-normalized input. The policy is fixed so results stay
//!    reproducible across turns.
//! 2. Named-entity extraction through the pluggable
//!    [`EntityExtractor`] seam. Novel entities become keyword
//!    proposals, assigned to the closest category by token overlap or
//!    to the configured fallback category.
//!
//! Extraction failure is never fatal: the categorizer logs a warning
//! and degrades to keyword-only matching.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use whisperclaw_core::category::{Category, normalize_text};
use whisperclaw_core::error::StoreError;
use whisperclaw_core::extract::EntityExtractor;
use whisperclaw_core::store::ContextStore;

/// A proposed `(category, keyword)` addition discovered from a novel entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordProposal {
    pub category: String,
    pub keyword: String,
}

/// A sentence of the input proposed as a durable fact for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPointCandidate {
    pub category: String,
    pub text: String,
}

/// The outcome of categorizing one input. No matches is valid, not an error.
#[derive(Debug, Clone, Default)]
pub struct CategorizationResult {
    /// Categories the input belongs to, in discovery order.
    pub matched: Vec<Category>,
    /// Keyword additions to apply at commit time (when auto-expand is on).
    pub proposals: Vec<KeywordProposal>,
    /// Declarative sentences worth remembering, per matched category.
    pub key_point_candidates: Vec<KeyPointCandidate>,
    /// True when entity extraction failed and only keyword matching ran.
    pub degraded: bool,
}

/// Tunables for the categorizer.
#[derive(Debug, Clone)]
pub struct CategorizerOptions {
    /// Apply keyword proposals unconditionally at commit time. When
    /// false, proposals are surfaced but never written.
    pub auto_expand: bool,
    /// Catch-all category for entities that match nothing well enough.
    pub fallback_category: String,
    /// Minimum token-overlap score for assigning a novel entity to an
    /// existing category instead of the fallback.
    pub min_overlap: f32,
    /// Additional stop-words on top of the built-in list.
    pub extra_stop_words: Vec<String>,
}

impl Default for CategorizerOptions {
    fn default() -> Self {
        Self {
            auto_expand: true,
            fallback_category: "general".into(),
            min_overlap: 0.34,
            extra_stop_words: Vec::new(),
        }
    }
}

/// Stop-words never proposed as keywords.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "but", "by", "for", "from", "has", "have", "how", "i",
    "in", "is", "it", "of", "on", "or", "our", "that", "the", "this", "to", "was", "we", "what",
    "when", "where", "which", "who", "why", "will", "with", "you",
];

/// The categorization pipeline. Reads the store; proposes writes that the
/// session driver applies at commit time.
pub struct Categorizer {
    store: Arc<dyn ContextStore>,
    extractor: Arc<dyn EntityExtractor>,
    options: CategorizerOptions,
}

impl Categorizer {
    pub fn new(
        store: Arc<dyn ContextStore>,
        extractor: Arc<dyn EntityExtractor>,
        options: CategorizerOptions,
    ) -> Self {
        Self {
            store,
            extractor,
            options,
        }
    }

    pub fn options(&self) -> &CategorizerOptions {
        &self.options
    }

    /// Categorize one input.
    pub async fn categorize(&self, text: &str) -> Result<CategorizationResult, StoreError> {
        let normalized = normalize_text(text);
        let tokens: HashSet<String> = tokenize(&normalized);
        let categories = self.store.list_categories().await?;

        let mut matched: Vec<Category> = Vec::new();
        for category in &categories {
            if category
                .keywords
                .iter()
                .any(|kw| keyword_matches(kw, &normalized, &tokens))
            {
                matched.push(category.clone());
            }
        }

        // Entity pass — degraded mode on failure, never turn-fatal.
        let (entities, degraded) = match self.extractor.extract(text) {
            Ok(entities) => (entities, false),
            Err(e) => {
                warn!("entity extraction degraded, keyword matching only: {e}");
                (Vec::new(), true)
            }
        };

        let mut proposals: Vec<KeywordProposal> = Vec::new();
        for entity in &entities {
            if self.is_stop_word(entity) {
                continue;
            }

            // An entity that is already a keyword somewhere pulls that
            // category into the match set instead of proposing anything.
            if let Some(owner) = categories.iter().find(|c| c.has_keyword(entity)) {
                if !matched.iter().any(|c| c.name == owner.name) {
                    matched.push(owner.clone());
                }
                continue;
            }

            let category = self
                .assign_category(entity, &categories)
                .unwrap_or_else(|| self.options.fallback_category.clone());
            debug!("proposing keyword {entity:?} for category {category:?}");
            if !proposals
                .iter()
                .any(|p| p.category == category && p.keyword.eq_ignore_ascii_case(entity))
            {
                proposals.push(KeywordProposal {
                    category,
                    keyword: entity.clone(),
                });
            }
        }

        let key_point_candidates = key_point_candidates(text, &matched);

        Ok(CategorizationResult {
            matched,
            proposals,
            key_point_candidates,
            degraded,
        })
    }

    /// Best category for a novel entity by token overlap against the
    /// category name and its keywords. None below the threshold.
    fn assign_category(&self, entity: &str, categories: &[Category]) -> Option<String> {
        let entity_tokens = tokenize(&normalize_text(entity));
        if entity_tokens.is_empty() {
            return None;
        }

        let mut best: Option<(f32, &str)> = None;
        for category in categories {
            let mut pool = tokenize(&normalize_text(&category.name));
            for kw in &category.keywords {
                pool.extend(tokenize(&normalize_text(kw)));
            }
            let overlap = entity_tokens.intersection(&pool).count() as f32
                / entity_tokens.len() as f32;
            if overlap > best.map_or(0.0, |(score, _)| score) {
                best = Some((overlap, &category.name));
            }
        }

        best.filter(|(score, _)| *score >= self.options.min_overlap)
            .map(|(_, name)| name.to_string())
    }

    fn is_stop_word(&self, term: &str) -> bool {
        let lower = term.to_lowercase();
        STOP_WORDS.contains(&lower.as_str())
            || self
                .options
                .extra_stop_words
                .iter()
                .any(|w| w.to_lowercase() == lower)
    }
}

/// Whole-token match for single-word keywords, substring match for
/// multi-word phrases. `normalized` and `tokens` come from the same input.
fn keyword_matches(keyword: &str, normalized: &str, tokens: &HashSet<String>) -> bool {
    let keyword = normalize_text(keyword);
    if keyword.is_empty() {
        return false;
    }
    if keyword.contains(' ') {
        normalized.contains(&keyword)
    } else {
        tokens.contains(&keyword)
    }
}

/// Case-normalized terms with edge punctuation trimmed.
fn tokenize(normalized: &str) -> HashSet<String> {
    normalized
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '-')
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Declarative sentences that mention a matched category's keyword.
/// Questions are requests for information, not durable facts.
fn key_point_candidates(text: &str, matched: &[Category]) -> Vec<KeyPointCandidate> {
    let mut candidates = Vec::new();
    for sentence in split_sentences(text) {
        if sentence.ends_with('?') {
            continue;
        }
        let normalized = normalize_text(sentence);
        let tokens = tokenize(&normalized);
        for category in matched {
            let mentions = category
                .keywords
                .iter()
                .any(|kw| keyword_matches(kw, &normalized, &tokens));
            if mentions {
                candidates.push(KeyPointCandidate {
                    category: category.name.clone(),
                    text: sentence.trim().to_string(),
                });
            }
        }
    }
    candidates
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
