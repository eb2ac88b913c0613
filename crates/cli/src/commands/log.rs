//! `whisperclaw log` — Show recent interactions.

use whisperclaw_config::AppConfig;
use whisperclaw_core::store::ContextStore;

pub async fn run(limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::open_store(&config).await?;

    let recent = store.recent_interactions(limit).await?;
    if recent.is_empty() {
        println!("The interaction log is empty.");
        return Ok(());
    }

    // Print oldest first so the terminal reads like the conversation did.
    for interaction in recent.iter().rev() {
        println!("[{}]", interaction.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("  user:      {}", interaction.user_text);
        println!("  assistant: {}", interaction.assistant_text);
    }
    Ok(())
}
