//! In-memory store — useful for testing and ephemeral sessions.
//!
//! Observable semantics match the SQLite backend exactly: keyword sets
//! are duplicate-free case-insensitively, key points list in
//! recency-descending order with insertion order breaking ties, and the
//! interaction log is append-only.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use whisperclaw_core::category::{Category, KeyPoint, normalize_name};
use whisperclaw_core::error::StoreError;
use whisperclaw_core::interaction::Interaction;
use whisperclaw_core::store::ContextStore;

#[derive(Default)]
struct Inner {
    /// name → keywords (insertion order preserved)
    categories: BTreeMap<String, Vec<String>>,
    /// key points with their insertion sequence for tie-breaking
    key_points: Vec<(u64, KeyPoint)>,
    interactions: Vec<Interaction>,
    next_seq: u64,
}

impl Inner {
    fn ensure_category(&mut self, name: &str) -> String {
        let name = normalize_name(name);
        self.categories.entry(name.clone()).or_default();
        name
    }
}

/// A store that keeps everything behind a single RwLock.
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl ContextStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get_or_create_category(&self, name: &str) -> Result<Category, StoreError> {
        let mut inner = self.inner.write().await;
        let name = inner.ensure_category(name);
        Ok(Category {
            keywords: inner.categories[&name].clone(),
            name,
        })
    }

    async fn add_keyword(&self, category: &str, keyword: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let name = normalize_name(category);
        let keywords = inner.categories.entry(name).or_default();
        let lower = keyword.to_lowercase();
        if !keywords.iter().any(|k| k.to_lowercase() == lower) {
            keywords.push(keyword.to_string());
        }
        Ok(())
    }

    async fn find_categories_by_keyword(&self, term: &str) -> Result<Vec<Category>, StoreError> {
        let inner = self.inner.read().await;
        let term = term.to_lowercase();
        Ok(inner
            .categories
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| k.to_lowercase() == term))
            .map(|(name, keywords)| Category {
                name: name.clone(),
                keywords: keywords.clone(),
            })
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .categories
            .iter()
            .map(|(name, keywords)| Category {
                name: name.clone(),
                keywords: keywords.clone(),
            })
            .collect())
    }

    async fn add_key_point(&self, category: &str, text: &str) -> Result<KeyPoint, StoreError> {
        let mut inner = self.inner.write().await;
        let name = inner.ensure_category(category);
        let point = KeyPoint::new(name, text);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.key_points.push((seq, point.clone()));
        Ok(point)
    }

    async fn reinforce_key_point(&self, id: &str) -> Result<bool, StoreError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let seq = inner.next_seq;
        match inner.key_points.iter_mut().find(|(_, kp)| kp.id == id) {
            Some((s, kp)) => {
                kp.last_reinforced_at = Utc::now();
                // A reinforced point also moves ahead in tie-breaking order.
                *s = seq;
                inner.next_seq += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_key_points(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<KeyPoint>, StoreError> {
        let inner = self.inner.read().await;
        let name = normalize_name(category);
        let mut points: Vec<(u64, KeyPoint)> = inner
            .key_points
            .iter()
            .filter(|(_, kp)| kp.category == name)
            .cloned()
            .collect();
        points.sort_by(|(sa, a), (sb, b)| {
            b.last_reinforced_at
                .cmp(&a.last_reinforced_at)
                .then(sb.cmp(sa))
        });
        points.truncate(limit);
        Ok(points.into_iter().map(|(_, kp)| kp).collect())
    }

    async fn key_point_count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.key_points.len())
    }

    async fn append_interaction(
        &self,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<Interaction, StoreError> {
        let mut inner = self.inner.write().await;
        let interaction = Interaction::new(user_text, assistant_text);
        inner.interactions.push(interaction.clone());
        Ok(interaction)
    }

    async fn recent_interactions(&self, n: usize) -> Result<Vec<Interaction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.interactions.iter().rev().take(n).cloned().collect())
    }

    async fn interaction_count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.interactions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn category_created_lazily_and_case_insensitive() {
        let store = InMemoryStore::new();
        let cat = store.get_or_create_category("Databases").await.unwrap();
        assert_eq!(cat.name, "databases");

        let again = store.get_or_create_category("  DATABASES ").await.unwrap();
        assert_eq!(again.name, "databases");
        assert_eq!(store.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_keyword_is_idempotent() {
        let store = InMemoryStore::new();
        store.add_keyword("devops", "Docker").await.unwrap();
        store.add_keyword("devops", "docker").await.unwrap();
        store.add_keyword("devops", "DOCKER").await.unwrap();

        let cat = store.get_or_create_category("devops").await.unwrap();
        assert_eq!(cat.keywords.len(), 1);
        assert_eq!(cat.keywords[0], "Docker");
    }

    #[tokio::test]
    async fn find_by_keyword_matches_case_insensitively() {
        let store = InMemoryStore::new();
        store.add_keyword("databases", "Postgres").await.unwrap();
        store.add_keyword("devops", "docker").await.unwrap();

        let hits = store.find_categories_by_keyword("postgres").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "databases");

        assert!(store.find_categories_by_keyword("redis").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn key_points_list_most_recently_reinforced_first() {
        let store = InMemoryStore::new();
        let a = store.add_key_point("databases", "uses WAL mode").await.unwrap();
        let _b = store.add_key_point("databases", "indexes are btree").await.unwrap();

        // Reinforce the older point — it should now list first.
        assert!(store.reinforce_key_point(&a.id).await.unwrap());
        let points = store.list_key_points("databases", 10).await.unwrap();
        assert_eq!(points[0].text, "uses WAL mode");
        assert_eq!(points.len(), 2);

        // Limit bounds the result.
        let points = store.list_key_points("databases", 1).await.unwrap();
        assert_eq!(points.len(), 1);
    }

    #[tokio::test]
    async fn reinforce_unknown_id_returns_false() {
        let store = InMemoryStore::new();
        assert!(!store.reinforce_key_point("nope").await.unwrap());
    }

    #[tokio::test]
    async fn key_point_round_trip_preserves_text() {
        let store = InMemoryStore::new();
        let text = "The staging cluster runs Kubernetes 1.30";
        store.add_key_point("deployment", text).await.unwrap();
        let points = store.list_key_points("deployment", 10).await.unwrap();
        assert_eq!(points[0].text, text);
    }

    #[tokio::test]
    async fn recent_interactions_most_recent_first() {
        let store = InMemoryStore::new();
        store.append_interaction("first", "one").await.unwrap();
        store.append_interaction("second", "two").await.unwrap();
        store.append_interaction("third", "three").await.unwrap();

        let recent = store.recent_interactions(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].user_text, "third");
        assert_eq!(recent[1].user_text, "second");

        // n == 0 → empty; n > log → whole log.
        assert!(store.recent_interactions(0).await.unwrap().is_empty());
        assert_eq!(store.recent_interactions(100).await.unwrap().len(), 3);
    }
}
