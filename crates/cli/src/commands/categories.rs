//! `whisperclaw categories` — List categories and keywords.

use whisperclaw_config::AppConfig;
use whisperclaw_core::store::ContextStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::open_store(&config).await?;

    let categories = store.list_categories().await?;
    if categories.is_empty() {
        println!("No categories yet — run `whisperclaw onboard` to seed them.");
        return Ok(());
    }

    for category in categories {
        let points = store.list_key_points(&category.name, usize::MAX).await?;
        println!("{} ({} key points)", category.name, points.len());
        if category.keywords.is_empty() {
            println!("  (no keywords)");
        } else {
            println!("  keywords: {}", category.keywords.join(", "));
        }
    }
    Ok(())
}
