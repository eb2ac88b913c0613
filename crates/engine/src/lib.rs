//! # Whisperclaw Engine
//!
//! The turn pipeline: categorize the user input, assemble a
//! budget-bounded context bundle, and (after the caller's model call
//! succeeds) commit the turn's mutations in one place.
//!
//! ```text
//! user input ──▶ Categorizer ──▶ ContextAssembler ──▶ TurnPlan
//!                                                        │
//!                        caller's model call             │
//!                                                        ▼
//!                                  SessionDriver::commit_turn
//!                        (interaction + keywords + key points)
//! ```

pub mod categorizer;
pub mod context;
pub mod extract;
pub mod session;

pub use categorizer::{
    CategorizationResult, Categorizer, CategorizerOptions, KeyPointCandidate, KeywordProposal,
};
pub use context::assembler::{ContextAssembler, TokenBudget};
pub use extract::HeuristicExtractor;
pub use session::{SessionDriver, TurnPlan};
