//! Heuristic named-entity extraction.
//!
//! A deterministic, dependency-free stand-in for a real NLP extractor:
//! consecutive capitalized tokens merge into one entity ("Google Cloud
//! Run"), and CamelCase or all-caps tokens count as technical terms
//! anywhere in the sentence. Plain capitalized words at the start of a
//! sentence are ignored — that is ordinary English, not an entity.

use whisperclaw_core::error::ExtractError;
use whisperclaw_core::extract::EntityExtractor;

/// Common words that are never entities even when capitalized mid-sentence.
const COMMON_WORDS: &[&str] = &[
    "a", "an", "and", "are", "but", "can", "do", "does", "for", "hello", "hey", "hi", "how", "i",
    "if", "in", "is", "it", "my", "of", "on", "or", "our", "please", "should", "that", "the",
    "then", "this", "to", "we", "what", "when", "where", "which", "who", "why", "will", "with",
    "you",
];

/// Continuous-chunk scanner over raw (non-normalized) input.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl EntityExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Result<Vec<String>, ExtractError> {
        let mut entities: Vec<String> = Vec::new();
        let mut current_chunk: Vec<&str> = Vec::new();
        let mut sentence_start = true;

        let mut flush = |chunk: &mut Vec<&str>, entities: &mut Vec<String>| {
            if chunk.is_empty() {
                return;
            }
            let entity = chunk.join(" ");
            chunk.clear();
            if !entities.iter().any(|e| e.eq_ignore_ascii_case(&entity)) {
                entities.push(entity);
            }
        };

        for raw in text.split_whitespace() {
            let ends_sentence = raw.ends_with(['.', '!', '?']);
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '-');
            if word.is_empty() {
                flush(&mut current_chunk, &mut entities);
                sentence_start = ends_sentence || sentence_start;
                continue;
            }

            let technical = is_technical(word);
            let capitalized = word.chars().next().is_some_and(|c| c.is_uppercase());
            let common = COMMON_WORDS.contains(&word.to_lowercase().as_str());

            // A capitalized word opening a sentence only counts when it is
            // technical or continues into a longer chunk.
            let entity_like = !common
                && (technical || (capitalized && (!sentence_start || !current_chunk.is_empty())));

            if entity_like {
                current_chunk.push(word);
            } else {
                flush(&mut current_chunk, &mut entities);
            }

            if ends_sentence {
                flush(&mut current_chunk, &mut entities);
            }
            sentence_start = ends_sentence;
        }
        flush(&mut current_chunk, &mut entities);

        Ok(entities)
    }
}

/// CamelCase, all-caps acronyms, digit-bearing names (S3, K8s), and
/// slashed terms (CI/CD) read as technical regardless of position.
fn is_technical(word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() < 2 {
        return false;
    }
    let interior_upper = chars[1..].iter().any(|c| c.is_uppercase());
    let has_lower = chars.iter().any(|c| c.is_lowercase());
    let all_caps = !has_lower && chars.iter().any(|c| c.is_uppercase());
    let has_digit = chars.iter().any(|c| c.is_ascii_digit());
    let has_slash = word.contains('/');
    (interior_upper && has_lower && chars[0].is_uppercase())
        || all_caps
        || (has_digit && chars.iter().any(|c| c.is_alphabetic()))
        || has_slash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<String> {
        HeuristicExtractor::new().extract(text).unwrap()
    }

    #[test]
    fn mid_sentence_proper_noun_is_extracted() {
        assert_eq!(extract("How do we deploy Kubernetes today?"), vec!["Kubernetes"]);
    }

    #[test]
    fn sentence_initial_plain_word_is_not_an_entity() {
        assert!(extract("Hello there, how are you?").is_empty());
        assert!(extract("Testing is important.").is_empty());
    }

    #[test]
    fn consecutive_capitalized_tokens_merge() {
        assert_eq!(
            extract("We moved the workload to Google Cloud Run last week"),
            vec!["Google Cloud Run"]
        );
    }

    #[test]
    fn camel_case_counts_anywhere() {
        assert_eq!(extract("PostgreSQL handles our writes"), vec!["PostgreSQL"]);
    }

    #[test]
    fn acronyms_and_versions_count() {
        let entities = extract("The API gateway talks to S3 over REST");
        assert_eq!(entities, vec!["API", "S3", "REST"]);
    }

    #[test]
    fn duplicates_are_removed_case_insensitively() {
        assert_eq!(
            extract("Docker builds run Docker images through DOCKER"),
            vec!["Docker"]
        );
    }

    #[test]
    fn punctuation_is_trimmed() {
        assert_eq!(extract("Have you tried Redis?"), vec!["Redis"]);
    }
}
