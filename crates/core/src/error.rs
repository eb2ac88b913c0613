//! Error types for the whisperclaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all whisperclaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Extraction errors ---
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    // --- Session errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the persistent store collaborator.
///
/// All of these are fatal for the current turn: the caller sees them
/// verbatim, and a failed write leaves prior state unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Failures of the entity-extraction collaborator.
///
/// Never fatal for a turn — the categorizer absorbs these and degrades
/// to keyword-only matching.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("Extractor unavailable: {0}")]
    Unavailable(String),

    #[error("Extraction failed: {0}")]
    Failed(String),
}

/// Misuse of the two-phase turn protocol.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `commit_turn` was called with a plan that does not match the
    /// driver's outstanding `process_turn`.
    #[error("Stale turn: commit does not match the outstanding turn (token {got}, expected {expected:?})")]
    StaleTurn { got: u64, expected: Option<u64> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_displays_correctly() {
        let err = Error::Store(StoreError::QueryFailed("no such table: key_points".into()));
        assert!(err.to_string().contains("no such table"));
        assert!(err.to_string().contains("Query failed"));
    }

    #[test]
    fn stale_turn_displays_tokens() {
        let err = Error::Session(SessionError::StaleTurn {
            got: 7,
            expected: Some(3),
        });
        assert!(err.to_string().contains("token 7"));
    }

    #[test]
    fn bounded_context_errors_convert_into_top_level() {
        let err: Error = StoreError::Unavailable("database locked".into()).into();
        assert!(err.to_string().starts_with("Store error"));

        let err: Error = ExtractError::Failed("tagger crashed".into()).into();
        assert!(err.to_string().starts_with("Extraction error"));

        let err: Error = SessionError::StaleTurn { got: 2, expected: None }.into();
        assert!(err.to_string().starts_with("Session error"));
    }

    #[test]
    fn extract_error_is_cloneable() {
        let err = ExtractError::Unavailable("model not loaded".into());
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
