//! Interaction domain type — one (user, assistant) exchange.
//!
//! Interactions are owned by the interaction log: append-only, timestamped,
//! and read back most-recent-first for recency-based retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single completed exchange between the user and the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Unique ID for this interaction
    pub id: String,

    /// What the user said
    pub user_text: String,

    /// What the assistant replied
    pub assistant_text: String,

    /// When the exchange was recorded
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    /// Create a new interaction timestamped now.
    pub fn new(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_roundtrips_through_json() {
        let it = Interaction::new("How do I tune indexes?", "Start with EXPLAIN ANALYZE.");
        let json = serde_json::to_string(&it).unwrap();
        let back: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_text, it.user_text);
        assert_eq!(back.assistant_text, it.assistant_text);
        assert_eq!(back.id, it.id);
    }
}
