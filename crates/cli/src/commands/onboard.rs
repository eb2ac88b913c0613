//! `whisperclaw onboard` — Initialize config and seed the store.

use whisperclaw_config::AppConfig;
use whisperclaw_core::store::ContextStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");

    let config = if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        AppConfig::load()?
    } else {
        let mut config = AppConfig::default();
        config.categories = AppConfig::default_categories();
        config.save(&config_path)?;
        println!("Wrote default config to {}", config_path.display());
        config
    };

    let store = super::open_store(&config).await?;
    let seeded = super::seed_categories(&config, store.as_ref()).await?;
    println!(
        "Seeded {} keywords across {} categories into the {} store",
        seeded,
        config.categories.len(),
        store.name()
    );
    println!("\nNext: whisperclaw assemble -m \"your first question\"");
    Ok(())
}
