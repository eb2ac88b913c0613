//! `whisperclaw assemble` — Prepare a turn and print the prompt.
//!
//! Read-only: runs categorization and assembly, prints what would be
//! sent to the model, and discards the plan. Use `record` to persist
//! a completed exchange.

use whisperclaw_config::AppConfig;
use whisperclaw_core::bundle::SegmentRole;

pub async fn run(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::open_store(&config).await?;
    let driver = super::build_driver(&config, store);

    let plan = driver.process_turn(message).await?;

    let matched: Vec<&str> = plan
        .categorization
        .matched
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    println!("Matched categories: {}", if matched.is_empty() { "(none)".into() } else { matched.join(", ") });
    for proposal in &plan.categorization.proposals {
        println!("Proposed keyword:   {:?} → {}", proposal.keyword, proposal.category);
    }
    if plan.categorization.degraded {
        println!("(entity extraction unavailable — keyword matching only)");
    }

    let stats = &plan.bundle.stats;
    println!(
        "Bundle: {} key points (of {}), {} interactions (of {}), ~{} tokens (budget {})",
        stats.key_points_included,
        stats.key_points_available,
        stats.interactions_included,
        stats.interactions_available,
        plan.bundle.estimated_tokens,
        config.context.token_budget,
    );

    println!("\n--- prompt ---");
    for segment in plan.bundle.segments(&config.system_prompt) {
        let role = match segment.role {
            SegmentRole::System => "system",
            SegmentRole::User => "user",
            SegmentRole::Assistant => "assistant",
        };
        println!("[{role}]\n{}\n", segment.content);
    }
    Ok(())
}
