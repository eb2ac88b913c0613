//! Budget-bounded context assembly.
//!
//! The assembler splits a total token budget into three pools —
//! key points, recent interactions, and headroom for the current turn
//! and response — and fills the first two under a hard cap with drop
//! tracking. Facts are never truncated mid-text: whatever does not fit
//! whole is omitted.

pub mod assembler;
pub mod token;

pub use assembler::{ContextAssembler, TokenBudget};
