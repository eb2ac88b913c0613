//! Category and KeyPoint domain types.
//!
//! A category is a named topic bucket grouping keywords and key points.
//! Key points are durable, short facts extracted from conversation and
//! stored under a category for long-term recall.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named topic bucket.
///
/// Names are case-normalized ([`normalize_name`]) and unique within a store.
/// The keyword set is duplicate-free under case-insensitive comparison; the
/// store enforces this on every `add_keyword`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Normalized category name (unique)
    pub name: String,

    /// Keywords and entities associated with this topic
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Category {
    /// Create an empty category with a normalized name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: normalize_name(name.as_ref()),
            keywords: Vec::new(),
        }
    }

    /// Case-insensitive keyword membership test.
    pub fn has_keyword(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.keywords.iter().any(|k| k.to_lowercase() == term)
    }
}

/// A durable fact stored under a category.
///
/// Owned exclusively by its category (`category` is a non-owning
/// back-reference by name). Never hard-deleted in normal operation;
/// re-asserting the same fact bumps `last_reinforced_at` instead of
/// inserting a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPoint {
    /// Unique ID for this key point
    pub id: String,

    /// Owning category name
    pub category: String,

    /// The fact text
    pub text: String,

    /// When this key point was first recorded
    pub created_at: DateTime<Utc>,

    /// When this key point was last re-asserted
    pub last_reinforced_at: DateTime<Utc>,
}

impl KeyPoint {
    /// Create a fresh key point for a category, timestamped now.
    pub fn new(category: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            category: category.into(),
            text: text.into(),
            created_at: now,
            last_reinforced_at: now,
        }
    }
}

/// Normalize a category name: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalize free text for duplicate detection: lowercased with
/// whitespace runs collapsed to single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_name_is_normalized() {
        let cat = Category::new("  Databases ");
        assert_eq!(cat.name, "databases");
    }

    #[test]
    fn keyword_membership_is_case_insensitive() {
        let mut cat = Category::new("databases");
        cat.keywords.push("Postgres".into());
        assert!(cat.has_keyword("postgres"));
        assert!(cat.has_keyword("POSTGRES"));
        assert!(!cat.has_keyword("mysql"));
    }

    #[test]
    fn key_point_starts_with_equal_timestamps() {
        let kp = KeyPoint::new("databases", "We use WAL mode in production");
        assert_eq!(kp.created_at, kp.last_reinforced_at);
        assert!(!kp.id.is_empty());
    }

    #[test]
    fn normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  We  use\tPostgres\n"), "we use postgres");
    }
}
