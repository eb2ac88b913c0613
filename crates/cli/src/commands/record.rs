//! `whisperclaw record` — Persist a completed exchange.
//!
//! The full two-phase turn in one command: categorize and assemble,
//! then commit with the assistant reply the caller obtained from its
//! own model call.

use whisperclaw_config::AppConfig;

pub async fn run(user: &str, assistant: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::open_store(&config).await?;
    let driver = super::build_driver(&config, store);

    let plan = driver.process_turn(user).await?;
    let matched = plan.categorization.matched.len();
    let proposals = plan.categorization.proposals.len();
    let facts = plan.categorization.key_point_candidates.len();

    let interaction = driver.commit_turn(plan, assistant).await?;

    println!("Recorded interaction {}", interaction.id);
    println!(
        "  {} matched categories, {} keyword proposals{}, {} key-point candidates",
        matched,
        proposals,
        if config.categorizer.auto_expand { " (applied)" } else { " (not applied: auto_expand off)" },
        facts,
    );
    Ok(())
}
