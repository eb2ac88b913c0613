//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. This
//! approximation is accurate within ~10% for BPE tokenizers on English
//! text, and the same estimator is used everywhere a budget decision is
//! made, so the assembler's guarantee is internally consistent.

use whisperclaw_core::category::KeyPoint;
use whisperclaw_core::interaction::Interaction;

/// Per-segment overhead for role name, delimiters, and formatting
/// markers in the API wire format.
pub const SEGMENT_OVERHEAD: usize = 4;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Estimate tokens for one role-tagged segment including overhead.
pub fn estimate_segment(text: &str) -> usize {
    SEGMENT_OVERHEAD + estimate_tokens(text)
}

/// Estimate tokens for a key point rendered as a list line.
pub fn estimate_key_point(point: &KeyPoint) -> usize {
    // "- " prefix and trailing newline round up by one token
    estimate_tokens(&point.text) + 1
}

/// Estimate tokens for an interaction: one user and one assistant segment.
pub fn estimate_interaction(interaction: &Interaction) -> usize {
    estimate_segment(&interaction.user_text) + estimate_segment(&interaction.assistant_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(estimate_tokens("test"), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn segment_includes_overhead() {
        assert_eq!(estimate_segment("test"), 5);
    }

    #[test]
    fn interaction_counts_both_sides() {
        let it = Interaction::new("hello", "there!");
        // 2 + 4 overhead + 2 + 4 overhead
        assert_eq!(estimate_interaction(&it), 12);
    }
}
