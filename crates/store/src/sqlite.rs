//! SQLite backend — the durable store.
//!
//! Uses a single SQLite database file with four tables:
//! - `categories` — one row per topic bucket
//! - `category_keywords` — keyword set per category, unique NOCASE
//! - `key_points` — durable facts owned by a category
//! - `interactions` — the append-only exchange log
//!
//! Every mutating trait call is a single statement or a single
//! transaction, committed before the call returns. The journal runs in
//! WAL mode with `synchronous=FULL` so a successful call survives a
//! crash.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use whisperclaw_core::category::{Category, KeyPoint, normalize_name};
use whisperclaw_core::error::StoreError;
use whisperclaw_core::interaction::Interaction;
use whisperclaw_core::store::ContextStore;

/// The production SQLite store.
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Timestamps are persisted as fixed-width RFC 3339 text so that SQL
/// `ORDER BY` over the column matches chronological order.
fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::QueryFailed(format!("bad timestamp {s:?}: {e}")))
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database (useful for
    /// tests). An in-memory database lives inside its connection, so the
    /// pool is pinned to a single connection in that case.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Unavailable(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .pragma("foreign_keys", "ON");

        let ephemeral = path.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if ephemeral { 1 } else { 4 })
            .min_connections(if ephemeral { 1 } else { 0 })
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite context store initialized at {path}");
        Ok(store)
    }

    /// Flush and close the pool. Part of the scoped open/close lifecycle
    /// managed at the process boundary.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run schema migrations — idempotent table and index creation.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                name       TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("categories table: {e}")))?;

        // Keyword uniqueness is case-insensitive at the schema level, so
        // `add_keyword` idempotence holds regardless of caller casing.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS category_keywords (
                category_name TEXT NOT NULL REFERENCES categories(name),
                keyword       TEXT NOT NULL COLLATE NOCASE,
                UNIQUE(category_name, keyword)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("category_keywords table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS key_points (
                iid                INTEGER PRIMARY KEY AUTOINCREMENT,
                id                 TEXT UNIQUE NOT NULL,
                category_name      TEXT NOT NULL REFERENCES categories(name),
                text               TEXT NOT NULL,
                created_at         TEXT NOT NULL,
                last_reinforced_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("key_points table: {e}")))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_key_points_recency
            ON key_points(category_name, last_reinforced_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("key_points index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS interactions (
                iid            INTEGER PRIMARY KEY AUTOINCREMENT,
                id             TEXT UNIQUE NOT NULL,
                user_text      TEXT NOT NULL,
                assistant_text TEXT NOT NULL,
                timestamp      TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("interactions table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Load one category's keyword set (insertion order).
    async fn keywords_for(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT keyword FROM category_keywords WHERE category_name = ?1 ORDER BY rowid",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("keywords: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get("keyword")
                    .map_err(|e| StoreError::QueryFailed(format!("keyword column: {e}")))
            })
            .collect()
    }

    fn row_to_key_point(row: &sqlx::sqlite::SqliteRow) -> Result<KeyPoint, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let category: String = row
            .try_get("category_name")
            .map_err(|e| StoreError::QueryFailed(format!("category_name column: {e}")))?;
        let text: String = row
            .try_get("text")
            .map_err(|e| StoreError::QueryFailed(format!("text column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
        let last_reinforced_at: String = row
            .try_get("last_reinforced_at")
            .map_err(|e| StoreError::QueryFailed(format!("last_reinforced_at column: {e}")))?;

        Ok(KeyPoint {
            id,
            category,
            text,
            created_at: decode_ts(&created_at)?,
            last_reinforced_at: decode_ts(&last_reinforced_at)?,
        })
    }

    fn row_to_interaction(row: &sqlx::sqlite::SqliteRow) -> Result<Interaction, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let user_text: String = row
            .try_get("user_text")
            .map_err(|e| StoreError::QueryFailed(format!("user_text column: {e}")))?;
        let assistant_text: String = row
            .try_get("assistant_text")
            .map_err(|e| StoreError::QueryFailed(format!("assistant_text column: {e}")))?;
        let timestamp: String = row
            .try_get("timestamp")
            .map_err(|e| StoreError::QueryFailed(format!("timestamp column: {e}")))?;

        Ok(Interaction {
            id,
            user_text,
            assistant_text,
            timestamp: decode_ts(&timestamp)?,
        })
    }

    async fn count(&self, table: &str) -> Result<usize, StoreError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("count {table}: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}

#[async_trait]
impl ContextStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get_or_create_category(&self, name: &str) -> Result<Category, StoreError> {
        let name = normalize_name(name);
        sqlx::query("INSERT OR IGNORE INTO categories (name, created_at) VALUES (?1, ?2)")
            .bind(&name)
            .bind(encode_ts(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("create category: {e}")))?;

        let keywords = self.keywords_for(&name).await?;
        Ok(Category { name, keywords })
    }

    async fn add_keyword(&self, category: &str, keyword: &str) -> Result<(), StoreError> {
        let name = normalize_name(category);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin: {e}")))?;

        sqlx::query("INSERT OR IGNORE INTO categories (name, created_at) VALUES (?1, ?2)")
            .bind(&name)
            .bind(encode_ts(Utc::now()))
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("create category: {e}")))?;

        // NOCASE unique index makes the duplicate insert a no-op.
        sqlx::query(
            "INSERT OR IGNORE INTO category_keywords (category_name, keyword) VALUES (?1, ?2)",
        )
        .bind(&name)
        .bind(keyword)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("add keyword: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit: {e}")))
    }

    async fn find_categories_by_keyword(&self, term: &str) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT category_name FROM category_keywords
            WHERE keyword = ?1 COLLATE NOCASE
            ORDER BY category_name
            "#,
        )
        .bind(term)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("find by keyword: {e}")))?;

        let mut categories = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row
                .try_get("category_name")
                .map_err(|e| StoreError::QueryFailed(format!("category_name column: {e}")))?;
            let keywords = self.keywords_for(&name).await?;
            categories.push(Category { name, keywords });
        }
        Ok(categories)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("list categories: {e}")))?;

        let mut categories = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row
                .try_get("name")
                .map_err(|e| StoreError::QueryFailed(format!("name column: {e}")))?;
            let keywords = self.keywords_for(&name).await?;
            categories.push(Category { name, keywords });
        }
        Ok(categories)
    }

    async fn add_key_point(&self, category: &str, text: &str) -> Result<KeyPoint, StoreError> {
        let name = normalize_name(category);
        let point = KeyPoint::new(name.clone(), text);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin: {e}")))?;

        sqlx::query("INSERT OR IGNORE INTO categories (name, created_at) VALUES (?1, ?2)")
            .bind(&name)
            .bind(encode_ts(point.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("create category: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO key_points (id, category_name, text, created_at, last_reinforced_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&point.id)
        .bind(&point.category)
        .bind(&point.text)
        .bind(encode_ts(point.created_at))
        .bind(encode_ts(point.last_reinforced_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("add key point: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit: {e}")))?;
        Ok(point)
    }

    async fn reinforce_key_point(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            // iid is bumped too so a reinforced point wins recency ties
            // against points inserted in the same microsecond.
            r#"
            UPDATE key_points
            SET last_reinforced_at = ?1,
                iid = (SELECT MAX(iid) + 1 FROM key_points)
            WHERE id = ?2
            "#,
        )
        .bind(encode_ts(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("reinforce: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_key_points(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<KeyPoint>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, category_name, text, created_at, last_reinforced_at
            FROM key_points
            WHERE category_name = ?1
            ORDER BY last_reinforced_at DESC, iid DESC
            LIMIT ?2
            "#,
        )
        .bind(normalize_name(category))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("list key points: {e}")))?;

        rows.iter().map(Self::row_to_key_point).collect()
    }

    async fn key_point_count(&self) -> Result<usize, StoreError> {
        self.count("key_points").await
    }

    async fn append_interaction(
        &self,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<Interaction, StoreError> {
        let interaction = Interaction::new(user_text, assistant_text);
        sqlx::query(
            r#"
            INSERT INTO interactions (id, user_text, assistant_text, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&interaction.id)
        .bind(&interaction.user_text)
        .bind(&interaction.assistant_text)
        .bind(encode_ts(interaction.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("append interaction: {e}")))?;
        Ok(interaction)
    }

    async fn recent_interactions(&self, n: usize) -> Result<Vec<Interaction>, StoreError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT id, user_text, assistant_text, timestamp
            FROM interactions
            ORDER BY iid DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::try_from(n).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("recent interactions: {e}")))?;

        rows.iter().map(Self::row_to_interaction).collect()
    }

    async fn interaction_count(&self) -> Result<usize, StoreError> {
        self.count("interactions").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn mem_store() -> SqliteStore {
        SqliteStore::new(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let store = mem_store().await;
        store.run_migrations().await.unwrap();
        assert_eq!(store.key_point_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn keyword_idempotence_via_nocase_unique() {
        let store = mem_store().await;
        store.add_keyword("devops", "Docker").await.unwrap();
        store.add_keyword("devops", "docker").await.unwrap();

        let cat = store.get_or_create_category("devops").await.unwrap();
        assert_eq!(cat.keywords, vec!["Docker".to_string()]);
    }

    #[tokio::test]
    async fn find_by_keyword_is_case_insensitive() {
        let store = mem_store().await;
        store.add_keyword("databases", "Postgres").await.unwrap();

        let hits = store.find_categories_by_keyword("POSTGRES").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "databases");
    }

    #[tokio::test]
    async fn key_points_order_by_reinforcement() {
        let store = mem_store().await;
        let first = store.add_key_point("testing", "we use cargo nextest").await.unwrap();
        store.add_key_point("testing", "coverage gate is 80%").await.unwrap();

        let points = store.list_key_points("testing", 10).await.unwrap();
        assert_eq!(points[0].text, "coverage gate is 80%");

        assert!(store.reinforce_key_point(&first.id).await.unwrap());
        let points = store.list_key_points("testing", 10).await.unwrap();
        assert_eq!(points[0].text, "we use cargo nextest");
        assert!(points[0].last_reinforced_at >= points[0].created_at);
    }

    #[tokio::test]
    async fn interactions_append_only_and_recent_first() {
        let store = mem_store().await;
        store.append_interaction("q1", "a1").await.unwrap();
        store.append_interaction("q2", "a2").await.unwrap();

        let recent = store.recent_interactions(5).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].user_text, "q2");
        assert!(store.recent_interactions(0).await.unwrap().is_empty());
        assert_eq!(store.interaction_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.sqlite");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::new(path).await.unwrap();
            store.add_keyword("databases", "postgres").await.unwrap();
            store.add_key_point("databases", "primary is on RDS").await.unwrap();
            store.append_interaction("hello", "hi").await.unwrap();
            store.close().await;
        }

        let store = SqliteStore::new(path).await.unwrap();
        let cat = store.get_or_create_category("databases").await.unwrap();
        assert_eq!(cat.keywords, vec!["postgres".to_string()]);
        assert_eq!(store.key_point_count().await.unwrap(), 1);
        assert_eq!(store.interaction_count().await.unwrap(), 1);
        store.close().await;
    }
}
