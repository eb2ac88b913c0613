//! `whisperclaw status` — Show store statistics.

use whisperclaw_config::AppConfig;
use whisperclaw_core::store::ContextStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    println!("whisperclaw status");
    println!("==================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Backend:      {}", config.store.backend);
    println!("  Database:     {}", config.db_path().display());
    println!("  Token budget: {}", config.context.token_budget);
    println!(
        "  Pool shares:  key points {:.0}%, interactions {:.0}%",
        config.context.key_point_share * 100.0,
        config.context.interaction_share * 100.0
    );
    println!(
        "  Auto-expand:  {}",
        if config.categorizer.auto_expand { "on" } else { "off" }
    );

    let store = super::open_store(&config).await?;
    println!();
    println!("  Categories:   {}", store.list_categories().await?.len());
    println!("  Key points:   {}", store.key_point_count().await?);
    println!("  Interactions: {}", store.interaction_count().await?);

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("\n  No config file — run `whisperclaw onboard` first");
    }
    Ok(())
}
