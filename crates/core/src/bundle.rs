//! ContextBundle — the ephemeral, budget-bounded context for one turn.
//!
//! Produced fresh per turn by the assembler and discarded after the
//! model call; never persisted. Renders to an ordered sequence of
//! role-tagged prompt segments for the model-API collaborator.

use crate::category::KeyPoint;
use crate::interaction::Interaction;
use serde::{Deserialize, Serialize};

/// Role tag on a rendered prompt segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentRole {
    System,
    User,
    Assistant,
}

/// One role-tagged text segment handed to the model-API collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSegment {
    pub role: SegmentRole,
    pub content: String,
}

impl PromptSegment {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: SegmentRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: SegmentRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: SegmentRole::Assistant, content: content.into() }
    }
}

/// Statistics about a single assembly pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyStats {
    /// Key points that made it into the bundle.
    pub key_points_included: usize,
    /// Key points available across matched categories before trimming.
    pub key_points_available: usize,
    /// Interactions that made it into the bundle.
    pub interactions_included: usize,
    /// Interactions available in the log before trimming.
    pub interactions_available: usize,
    /// Items dropped per pool during budget enforcement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drops: Vec<DropInfo>,
}

/// Information about items dropped from a pool during budget enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropInfo {
    /// Which pool ("key_points" or "interactions").
    pub pool: String,
    /// Number of items dropped.
    pub items_dropped: usize,
    /// Estimated tokens of dropped content.
    pub tokens_dropped: usize,
    /// Reason for dropping.
    pub reason: String,
}

/// The assembled context for one turn.
///
/// `key_points` are ordered most-recently-reinforced first (most relevant
/// first); `interactions` are ordered most recent first, as retrieved.
/// Rendering reverses both so the most relevant material sits nearest
/// the current user turn.
#[derive(Debug, Clone)]
pub struct ContextBundle {
    /// Selected key points, recency-descending.
    pub key_points: Vec<KeyPoint>,
    /// Selected interactions, most recent first.
    pub interactions: Vec<Interaction>,
    /// The current user input.
    pub user_text: String,
    /// Estimated token count for the whole bundle (always ≤ the budget
    /// it was assembled under).
    pub estimated_tokens: usize,
    /// Assembly accounting.
    pub stats: AssemblyStats,
}

impl ContextBundle {
    /// Render the bundle as an ordered sequence of role-tagged segments:
    /// system prompt (with the key-point section appended, least relevant
    /// first so the most relevant fact sits closest to the user turn),
    /// then the selected interactions oldest→newest, then the current
    /// user input.
    pub fn segments(&self, system_prompt: &str) -> Vec<PromptSegment> {
        let mut segments = Vec::with_capacity(2 + self.interactions.len() * 2);

        let mut system = system_prompt.to_string();
        if !self.key_points.is_empty() {
            let mut section = String::from("[Key Points]\n");
            for kp in self.key_points.iter().rev() {
                section.push_str("- ");
                section.push_str(&kp.text);
                section.push('\n');
            }
            if system.is_empty() {
                system = section;
            } else {
                system = format!("{system}\n\n{section}");
            }
        }
        if !system.is_empty() {
            segments.push(PromptSegment::system(system));
        }

        for it in self.interactions.iter().rev() {
            segments.push(PromptSegment::user(&it.user_text));
            segments.push(PromptSegment::assistant(&it.assistant_text));
        }

        segments.push(PromptSegment::user(&self.user_text));
        segments
    }

    /// True when nothing but the user input made it into the bundle.
    pub fn is_bare(&self) -> bool {
        self.key_points.is_empty() && self.interactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle_with(points: Vec<KeyPoint>, interactions: Vec<Interaction>) -> ContextBundle {
        ContextBundle {
            key_points: points,
            interactions,
            user_text: "What next?".into(),
            estimated_tokens: 0,
            stats: AssemblyStats::default(),
        }
    }

    #[test]
    fn bare_bundle_renders_only_user_input() {
        let bundle = bundle_with(vec![], vec![]);
        let segments = bundle.segments("");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].role, SegmentRole::User);
        assert_eq!(segments[0].content, "What next?");
    }

    #[test]
    fn most_relevant_key_point_renders_last_in_section() {
        let bundle = bundle_with(
            vec![
                KeyPoint::new("databases", "most recent fact"),
                KeyPoint::new("databases", "older fact"),
            ],
            vec![],
        );
        let segments = bundle.segments("You are a helpful assistant.");
        let system = &segments[0].content;
        let older = system.find("older fact").unwrap();
        let recent = system.find("most recent fact").unwrap();
        assert!(older < recent, "least relevant should come first in the section");
    }

    #[test]
    fn interactions_render_chronologically() {
        let bundle = bundle_with(
            vec![],
            vec![
                Interaction::new("second question", "second answer"),
                Interaction::new("first question", "first answer"),
            ],
        );
        let segments = bundle.segments("sys");
        // system, then first q/a, then second q/a, then current input
        assert_eq!(segments.len(), 6);
        assert_eq!(segments[1].content, "first question");
        assert_eq!(segments[2].content, "first answer");
        assert_eq!(segments[3].content, "second question");
        assert_eq!(segments[5].content, "What next?");
    }
}
