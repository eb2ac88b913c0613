//! Subcommand implementations and shared wiring.

pub mod assemble;
pub mod categories;
pub mod keypoint;
pub mod log;
pub mod onboard;
pub mod record;
pub mod status;

use std::sync::Arc;
use whisperclaw_config::AppConfig;
use whisperclaw_core::store::ContextStore;
use whisperclaw_engine::categorizer::{Categorizer, CategorizerOptions};
use whisperclaw_engine::context::assembler::{ContextAssembler, TokenBudget};
use whisperclaw_engine::context::token;
use whisperclaw_engine::extract::HeuristicExtractor;
use whisperclaw_engine::session::SessionDriver;
use whisperclaw_store::{InMemoryStore, SqliteStore};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Open the configured store. The lifecycle is scoped to the command:
/// opened here, dropped (and for SQLite, flushed) when the command ends.
pub async fn open_store(config: &AppConfig) -> CliResult<Arc<dyn ContextStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        _ => {
            let path = config.db_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let path = path
                .to_str()
                .ok_or_else(|| format!("non-UTF-8 database path: {}", path.display()))?
                .to_string();
            Ok(Arc::new(SqliteStore::new(&path).await?))
        }
    }
}

/// Build the full turn pipeline from config.
pub fn build_driver(config: &AppConfig, store: Arc<dyn ContextStore>) -> SessionDriver {
    let categorizer = Categorizer::new(
        store.clone(),
        Arc::new(HeuristicExtractor::new()),
        CategorizerOptions {
            auto_expand: config.categorizer.auto_expand,
            fallback_category: config.categorizer.fallback_category.clone(),
            min_overlap: config.categorizer.min_overlap,
            extra_stop_words: config.categorizer.stop_words.clone(),
        },
    );

    let assembler = ContextAssembler::new(TokenBudget {
        total: config.context.token_budget,
        system_reserve: token::estimate_segment(&config.system_prompt),
        key_point_share: config.context.key_point_share,
        interaction_share: config.context.interaction_share,
    });

    SessionDriver::new(store, categorizer, assembler)
}

/// Load seed categories from config into the store (idempotent).
pub async fn seed_categories(config: &AppConfig, store: &dyn ContextStore) -> CliResult<usize> {
    let mut added = 0;
    for (name, keywords) in &config.categories {
        for keyword in keywords {
            store.add_keyword(name, keyword).await?;
            added += 1;
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_config() -> AppConfig {
        AppConfig {
            categories: AppConfig::default_categories(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn seeded_keywords_are_findable() {
        let config = seeded_config();
        let store = InMemoryStore::new();

        seed_categories(&config, &store).await.unwrap();

        let hits = store.find_categories_by_keyword("unit test").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "testing");
        assert_eq!(
            store.list_categories().await.unwrap().len(),
            config.categories.len()
        );
    }

    #[tokio::test]
    async fn re_seeding_adds_no_duplicate_keywords() {
        let config = seeded_config();
        let store = InMemoryStore::new();

        seed_categories(&config, &store).await.unwrap();
        let before = store.get_or_create_category("testing").await.unwrap().keywords;

        seed_categories(&config, &store).await.unwrap();
        let after = store.get_or_create_category("testing").await.unwrap().keywords;
        assert_eq!(before, after);
    }
}
