//! EntityExtractor trait — the pluggable NER seam.
//!
//! Extraction quality is delegated to whatever sits behind this trait
//! (a heuristic scanner, an NLP library, a remote service). The
//! categorizer only requires "text in, entity strings out" and treats
//! failure or emptiness as non-fatal degradation.

use crate::error::ExtractError;

/// One-method capability: raw text → named entities.
///
/// Implementations must be deterministic for the same input so the
/// categorizer's behavior stays testable.
pub trait EntityExtractor: Send + Sync {
    /// Extract entity strings (proper nouns, technical terms, product
    /// names) from raw input. Order should be first-occurrence order;
    /// duplicates should already be removed.
    fn extract(&self, text: &str) -> Result<Vec<String>, ExtractError>;
}

/// Extractor that never finds anything — for keyword-only setups
/// and as a test stand-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtractor;

impl EntityExtractor for NoopExtractor {
    fn extract(&self, _text: &str) -> Result<Vec<String>, ExtractError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_extracts_nothing() {
        let entities = NoopExtractor.extract("Kubernetes runs on Google Cloud").unwrap();
        assert!(entities.is_empty());
    }
}
