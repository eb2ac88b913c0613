//! # Whisperclaw Core
//!
//! Domain types, traits, and error definitions for the whisperclaw context
//! engine. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is defined as a trait here: the persistent store
//! ([`ContextStore`]) and the entity extractor ([`EntityExtractor`]).
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with deterministic stubs
//! - Clean dependency graph (all crates depend inward on core)

pub mod bundle;
pub mod category;
pub mod error;
pub mod extract;
pub mod interaction;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use bundle::{AssemblyStats, ContextBundle, DropInfo, PromptSegment, SegmentRole};
pub use category::{Category, KeyPoint, normalize_name, normalize_text};
pub use error::{Error, ExtractError, Result, SessionError, StoreError};
pub use extract::{EntityExtractor, NoopExtractor};
pub use interaction::Interaction;
pub use store::ContextStore;
