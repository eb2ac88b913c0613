//! Whisperclaw CLI — the main entry point.
//!
//! Commands:
//! - `onboard`    — Initialize config & seed categories
//! - `assemble`   — Prepare a turn and print the prompt segments
//! - `record`     — Commit a turn with an externally produced reply
//! - `categories` — List categories and their keywords
//! - `keypoint`   — Add or list key points
//! - `log`        — Show recent interactions
//! - `status`     — Show store statistics

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "whisperclaw",
    about = "whisperclaw — context memory for conversational assistants",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and seed the category store
    Onboard,

    /// Categorize a message and print the assembled prompt (no writes)
    Assemble {
        /// The user message to prepare a turn for
        #[arg(short, long)]
        message: String,
    },

    /// Record a completed turn: categorize, then persist the exchange
    Record {
        /// The user side of the exchange
        #[arg(short, long)]
        user: String,

        /// The assistant's reply (produced by your model call)
        #[arg(short, long)]
        assistant: String,
    },

    /// List categories and their keywords
    Categories,

    /// Manage key points
    Keypoint {
        #[command(subcommand)]
        action: KeypointAction,
    },

    /// Show recent interactions
    Log {
        /// How many exchanges to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Show store statistics
    Status,
}

#[derive(Subcommand)]
enum KeypointAction {
    /// Record a key point under a category
    Add { category: String, text: String },

    /// List a category's key points, most recently reinforced first
    List {
        category: String,
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Assemble { message } => commands::assemble::run(&message).await?,
        Commands::Record { user, assistant } => commands::record::run(&user, &assistant).await?,
        Commands::Categories => commands::categories::run().await?,
        Commands::Keypoint { action } => match action {
            KeypointAction::Add { category, text } => {
                commands::keypoint::add(&category, &text).await?
            }
            KeypointAction::List { category, limit } => {
                commands::keypoint::list(&category, limit).await?
            }
        },
        Commands::Log { limit } => commands::log::run(limit).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
