//! `whisperclaw keypoint` — Key-point management.

use whisperclaw_config::AppConfig;
use whisperclaw_core::store::ContextStore;

pub async fn add(category: &str, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::open_store(&config).await?;

    let point = store.add_key_point(category, text).await?;
    println!("Recorded key point {} under {:?}", point.id, point.category);
    Ok(())
}

pub async fn list(category: &str, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::open_store(&config).await?;

    let points = store.list_key_points(category, limit).await?;
    if points.is_empty() {
        println!("No key points under {category:?}.");
        return Ok(());
    }

    for point in points {
        println!(
            "  [{}] {}",
            point.last_reinforced_at.format("%Y-%m-%d %H:%M"),
            point.text
        );
    }
    Ok(())
}
