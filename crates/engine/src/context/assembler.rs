//! The context assembler — relevance under a hard budget.
//!
//! Selection policy (deliberate simplicity-over-optimality):
//! - Key points merge across matched categories by reinforcement
//!   recency, deduplicate by normalized text, and fill as a strict
//!   recency-order **prefix**. A later, shorter point never slips in
//!   ahead of a point that did not fit.
//! - Interactions fill as the largest most-recent window whose
//!   cumulative estimate fits.
//! - A fact that does not fit whole is omitted, never truncated.
//!
//! Assembly is deterministic: identical store state and input always
//! produce an identical bundle.

use crate::context::token;
use whisperclaw_core::bundle::{AssemblyStats, ContextBundle, DropInfo};
use whisperclaw_core::category::{Category, KeyPoint, normalize_text};
use whisperclaw_core::error::StoreError;
use whisperclaw_core::store::ContextStore;

/// Token budget configuration.
///
/// `total` covers everything injected for the turn. `system_reserve`
/// is the fixed cost of the caller's system prompt, taken off the top.
/// The key-point and interaction pools take their shares of the
/// remainder; whatever is left is headroom for the current user turn
/// and the response.
#[derive(Debug, Clone)]
pub struct TokenBudget {
    pub total: usize,
    pub system_reserve: usize,
    pub key_point_share: f32,
    pub interaction_share: f32,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            total: 4096,
            system_reserve: 0,
            key_point_share: 1.0 / 3.0,
            interaction_share: 1.0 / 3.0,
        }
    }
}

/// The context assembler. Stateless — create one and reuse it.
pub struct ContextAssembler {
    budget: TokenBudget,
    /// Per-category read bound passed to `list_key_points`.
    key_points_per_category: usize,
    /// How many log entries to consider for the recency window.
    recent_fetch_limit: usize,
}

impl ContextAssembler {
    /// Create a new assembler with the given token budget.
    pub fn new(budget: TokenBudget) -> Self {
        Self {
            budget,
            key_points_per_category: 50,
            recent_fetch_limit: 50,
        }
    }

    /// Create an assembler with the default budget (4096 tokens).
    pub fn with_default_budget() -> Self {
        Self::new(TokenBudget::default())
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    /// Assemble the bundle for one turn.
    ///
    /// The returned bundle's `estimated_tokens` never exceeds
    /// `total - system_reserve` as long as the user turn itself fits;
    /// an oversized user turn yields a bare bundle that reports its
    /// true estimate (what to do about it is the caller's decision).
    pub async fn assemble(
        &self,
        user_text: &str,
        matched: &[Category],
        store: &dyn ContextStore,
    ) -> Result<ContextBundle, StoreError> {
        let usable = self.budget.total.saturating_sub(self.budget.system_reserve);
        let user_tokens = token::estimate_segment(user_text);
        let available = usable.saturating_sub(user_tokens);

        let mut drops: Vec<DropInfo> = Vec::new();

        // ── Key-point pool ─────────────────────────────────────────────
        let kp_budget = share_of(usable, self.budget.key_point_share).min(available);
        let merged = self.gather_key_points(matched, store).await?;
        let kp_available = merged.len();

        let mut key_points: Vec<KeyPoint> = Vec::new();
        let mut kp_used = 0;
        let mut kp_dropped_tokens = 0;
        for point in merged {
            let cost = token::estimate_key_point(&point);
            if kp_used + cost <= kp_budget && kp_dropped_tokens == 0 {
                kp_used += cost;
                key_points.push(point);
            } else {
                // Strict prefix: once one point fails to fit, everything
                // after it is out regardless of size.
                kp_dropped_tokens += cost;
            }
        }
        if kp_available > key_points.len() {
            drops.push(DropInfo {
                pool: "key_points".into(),
                items_dropped: kp_available - key_points.len(),
                tokens_dropped: kp_dropped_tokens,
                reason: "Key-point budget exhausted (strict recency prefix)".into(),
            });
        }

        // ── Interaction pool ───────────────────────────────────────────
        let int_budget =
            share_of(usable, self.budget.interaction_share).min(available - kp_used);
        let interactions_available = store.interaction_count().await?;
        let fetched = store.recent_interactions(self.recent_fetch_limit).await?;

        let mut interactions = Vec::new();
        let mut int_used = 0;
        let mut int_dropped = 0;
        let mut int_dropped_tokens = 0;
        for interaction in fetched {
            let cost = token::estimate_interaction(&interaction);
            if int_used + cost <= int_budget && int_dropped == 0 {
                int_used += cost;
                interactions.push(interaction);
            } else {
                // Contiguous recency window: stop at the first exchange
                // that does not fit.
                int_dropped += 1;
                int_dropped_tokens += cost;
            }
        }
        if interactions_available > interactions.len() {
            drops.push(DropInfo {
                pool: "interactions".into(),
                items_dropped: interactions_available - interactions.len(),
                tokens_dropped: int_dropped_tokens,
                reason: "Interaction budget exhausted (recency window)".into(),
            });
        }

        let stats = AssemblyStats {
            key_points_included: key_points.len(),
            key_points_available: kp_available,
            interactions_included: interactions.len(),
            interactions_available,
            drops,
        };

        Ok(ContextBundle {
            estimated_tokens: user_tokens + kp_used + int_used,
            key_points,
            interactions,
            user_text: user_text.to_string(),
            stats,
        })
    }

    /// Gather key points across matched categories, merge by
    /// reinforcement recency, and deduplicate by normalized text
    /// (the most recent occurrence wins).
    async fn gather_key_points(
        &self,
        matched: &[Category],
        store: &dyn ContextStore,
    ) -> Result<Vec<KeyPoint>, StoreError> {
        let mut merged: Vec<KeyPoint> = Vec::new();
        for category in matched {
            merged.extend(
                store
                    .list_key_points(&category.name, self.key_points_per_category)
                    .await?,
            );
        }
        merged.sort_by(|a, b| b.last_reinforced_at.cmp(&a.last_reinforced_at));

        let mut seen = std::collections::HashSet::new();
        merged.retain(|kp| seen.insert(normalize_text(&kp.text)));
        Ok(merged)
    }
}

fn share_of(total: usize, share: f32) -> usize {
    (total as f32 * share).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use whisperclaw_core::store::ContextStore;
    use whisperclaw_store::InMemoryStore;

    fn budget(total: usize) -> TokenBudget {
        TokenBudget {
            total,
            system_reserve: 0,
            key_point_share: 1.0 / 3.0,
            interaction_share: 1.0 / 3.0,
        }
    }

    async fn matched(store: &InMemoryStore, name: &str) -> Vec<Category> {
        vec![store.get_or_create_category(name).await.unwrap()]
    }

    #[tokio::test]
    async fn empty_store_yields_bare_bundle() {
        let store = InMemoryStore::new();
        let asm = ContextAssembler::with_default_budget();

        let bundle = asm.assemble("Hello", &[], &store).await.unwrap();
        assert!(bundle.is_bare());
        assert_eq!(bundle.user_text, "Hello");
        assert_eq!(bundle.estimated_tokens, token::estimate_segment("Hello"));
    }

    #[tokio::test]
    async fn estimate_never_exceeds_budget() {
        let store = InMemoryStore::new();
        for i in 0..20 {
            store
                .add_key_point("databases", &format!("durable fact number {i} about the database"))
                .await
                .unwrap();
            store
                .append_interaction(
                    &format!("question {i} with a reasonable amount of text"),
                    &format!("answer {i} with a reasonable amount of text"),
                )
                .await
                .unwrap();
        }
        let cats = matched(&store, "databases").await;

        for total in [32, 64, 128, 256, 512, 1024, 4096] {
            let asm = ContextAssembler::new(budget(total));
            let bundle = asm.assemble("How is the database doing?", &cats, &store).await.unwrap();
            assert!(
                bundle.estimated_tokens <= total,
                "estimate {} exceeded budget {total}",
                bundle.estimated_tokens
            );
        }
    }

    #[tokio::test]
    async fn exactly_two_of_five_fit() {
        let store = InMemoryStore::new();
        // 34 chars → 9 tokens, +1 per point line → 10 tokens each.
        for i in 0..5 {
            store
                .add_key_point("databases", &format!("fact {i} padded to thirty-six chars!"))
                .await
                .unwrap();
        }
        let cats = matched(&store, "databases").await;

        // usable 60 → kp pool 20 → exactly two points, never a truncated third.
        let asm = ContextAssembler::new(budget(60));
        let bundle = asm.assemble("x", &cats, &store).await.unwrap();
        assert_eq!(bundle.key_points.len(), 2);
        assert_eq!(bundle.key_points[0].text, "fact 4 padded to thirty-six chars!");
        assert_eq!(bundle.key_points[1].text, "fact 3 padded to thirty-six chars!");
        assert_eq!(bundle.stats.drops.len(), 1);
        assert_eq!(bundle.stats.drops[0].items_dropped, 3);
    }

    #[tokio::test]
    async fn strict_prefix_never_back_fills_with_shorter_points() {
        let store = InMemoryStore::new();
        store.add_key_point("notes", "tiny old fact").await.unwrap();
        store
            .add_key_point(
                "notes",
                &"a much longer recent fact ".repeat(8),
            )
            .await
            .unwrap();
        store
            .add_key_point("notes", &"another long recent fact ".repeat(8))
            .await
            .unwrap();
        let cats = matched(&store, "notes").await;

        // Pool fits the newest long fact but not the second; the tiny old
        // fact would fit, but strict recency order excludes it.
        let asm = ContextAssembler::new(budget(240));
        let bundle = asm.assemble("x", &cats, &store).await.unwrap();
        assert_eq!(bundle.key_points.len(), 1);
        assert!(bundle.key_points[0].text.starts_with("another long"));
    }

    #[tokio::test]
    async fn duplicate_texts_collapse_to_most_recent() {
        let store = InMemoryStore::new();
        store.add_key_point("databases", "We use Postgres").await.unwrap();
        store.add_key_point("general", "we use   postgres").await.unwrap();
        let mut cats = matched(&store, "databases").await;
        cats.extend(matched(&store, "general").await);

        let asm = ContextAssembler::with_default_budget();
        let bundle = asm.assemble("x", &cats, &store).await.unwrap();
        assert_eq!(bundle.key_points.len(), 1);
        assert_eq!(bundle.key_points[0].category, "general");
    }

    #[tokio::test]
    async fn recency_order_is_preserved_in_bundle() {
        let store = InMemoryStore::new();
        store.add_key_point("notes", "older point").await.unwrap();
        store.add_key_point("notes", "newer point").await.unwrap();
        let cats = matched(&store, "notes").await;

        let asm = ContextAssembler::with_default_budget();
        let bundle = asm.assemble("x", &cats, &store).await.unwrap();
        assert_eq!(bundle.key_points[0].text, "newer point");
        assert_eq!(bundle.key_points[1].text, "older point");
    }

    #[tokio::test]
    async fn interaction_window_keeps_most_recent() {
        let store = InMemoryStore::new();
        for i in 0..10 {
            store
                .append_interaction(
                    &format!("user message {i} padded for size"),
                    &format!("assistant reply {i} padded for size"),
                )
                .await
                .unwrap();
        }

        let asm = ContextAssembler::new(budget(120));
        let bundle = asm.assemble("x", &[], &store).await.unwrap();
        assert!(!bundle.interactions.is_empty());
        assert!(bundle.interactions.len() < 10);
        // Most recent first inside the bundle.
        assert!(bundle.interactions[0].user_text.contains("message 9"));
    }
}
