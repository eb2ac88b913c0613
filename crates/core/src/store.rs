//! ContextStore trait — the persistent key-point/category store.
//!
//! The store keeps two kinds of state:
//! - Categories: name → keyword set + owned key points
//! - The interaction log: append-only (user, assistant) exchanges
//!
//! Every mutating call persists synchronously before returning (no
//! write-back caching) and is atomic with respect to concurrent callers:
//! a crash after a successful call never loses the write, and a failed
//! write leaves prior state unchanged. Reads observe a consistent
//! snapshot and may run concurrently with writes.

use crate::category::{Category, KeyPoint};
use crate::error::StoreError;
use crate::interaction::Interaction;
use async_trait::async_trait;

/// The persistent store seam.
///
/// Implementations: SQLite (durable), in-memory (testing / ephemeral
/// sessions). Content-level deduplication of key points is deliberately
/// *not* the store's job — that belongs to the categorizer.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    // --- Categories ---

    /// Case-insensitive lookup; creates an empty category if absent.
    async fn get_or_create_category(&self, name: &str) -> Result<Category, StoreError>;

    /// Add a keyword to a category. Idempotent: a case-insensitive
    /// duplicate is a no-op, never an error. Creates the category lazily.
    async fn add_keyword(&self, category: &str, keyword: &str) -> Result<(), StoreError>;

    /// All categories whose keyword set contains a case-insensitive
    /// match of `term`.
    async fn find_categories_by_keyword(&self, term: &str) -> Result<Vec<Category>, StoreError>;

    /// All categories, sorted by name.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    // --- Key points ---

    /// Append a key point to a category. Does not deduplicate by content.
    async fn add_key_point(&self, category: &str, text: &str) -> Result<KeyPoint, StoreError>;

    /// Bump `last_reinforced_at` on a re-asserted key point.
    /// Returns false if no key point with that ID exists.
    async fn reinforce_key_point(&self, id: &str) -> Result<bool, StoreError>;

    /// Key points for a category, most-recently-reinforced first,
    /// bounded by `limit` for budget control.
    async fn list_key_points(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<KeyPoint>, StoreError>;

    /// Total key points across all categories.
    async fn key_point_count(&self) -> Result<usize, StoreError>;

    // --- Interaction log ---

    /// Record a completed exchange with the current timestamp.
    /// Append-only, monotonically increasing order.
    async fn append_interaction(
        &self,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<Interaction, StoreError>;

    /// The last `n` interactions, most recent first. `n == 0` returns
    /// empty; `n` larger than the log returns the whole log, no error.
    async fn recent_interactions(&self, n: usize) -> Result<Vec<Interaction>, StoreError>;

    /// Total interactions in the log.
    async fn interaction_count(&self) -> Result<usize, StoreError>;
}
