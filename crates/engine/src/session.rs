//! Session driver — the two-phase turn protocol.
//!
//! `process_turn` reads (categorize, assemble) and mutates nothing;
//! `commit_turn` is the single point where the store changes for a
//! turn. The caller runs its model call between the two phases and
//! must not commit a turn whose model call failed — the split
//! guarantees the store never records a turn that did not complete.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use whisperclaw_core::Result;
use whisperclaw_core::bundle::ContextBundle;
use whisperclaw_core::category::normalize_text;
use whisperclaw_core::error::SessionError;
use whisperclaw_core::interaction::Interaction;
use whisperclaw_core::store::ContextStore;

use crate::categorizer::{CategorizationResult, Categorizer};
use crate::context::assembler::ContextAssembler;

/// The prepared, not-yet-committed turn.
///
/// Consumed by value on commit, so one plan can be committed at most
/// once; the compiler enforces what the protocol demands.
#[derive(Debug)]
pub struct TurnPlan {
    token: u64,
    pub user_text: String,
    pub categorization: CategorizationResult,
    pub bundle: ContextBundle,
}

/// Orchestrates one turn against an explicitly injected store.
///
/// Single-session cooperative model: one turn in flight at a time.
/// The driver tracks the outstanding turn's token and rejects commits
/// for any other plan.
pub struct SessionDriver {
    store: std::sync::Arc<dyn ContextStore>,
    categorizer: Categorizer,
    assembler: ContextAssembler,
    pending: Mutex<Option<u64>>,
    next_token: AtomicU64,
}

impl SessionDriver {
    pub fn new(
        store: std::sync::Arc<dyn ContextStore>,
        categorizer: Categorizer,
        assembler: ContextAssembler,
    ) -> Self {
        Self {
            store,
            categorizer,
            assembler,
            pending: Mutex::new(None),
            next_token: AtomicU64::new(1),
        }
    }

    /// Phase one: categorize the input and assemble the context bundle.
    /// Reads only; repeated calls simply replace the outstanding plan.
    pub async fn process_turn(&self, user_text: &str) -> Result<TurnPlan> {
        let categorization = self.categorizer.categorize(user_text).await?;
        let bundle = self
            .assembler
            .assemble(user_text, &categorization.matched, self.store.as_ref())
            .await?;

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        *self.pending.lock().expect("pending lock poisoned") = Some(token);
        debug!(
            token,
            matched = categorization.matched.len(),
            proposals = categorization.proposals.len(),
            estimated_tokens = bundle.estimated_tokens,
            "turn prepared"
        );

        Ok(TurnPlan {
            token,
            user_text: user_text.to_string(),
            categorization,
            bundle,
        })
    }

    /// Phase two: persist everything the turn produced.
    ///
    /// The single mutation point: appends the interaction, applies
    /// accepted keyword proposals (when auto-expand is on), and stores
    /// or reinforces key-point candidates. Committing a plan that is
    /// not the outstanding turn is [`SessionError::StaleTurn`].
    pub async fn commit_turn(
        &self,
        plan: TurnPlan,
        assistant_text: &str,
    ) -> Result<Interaction> {
        {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            if *pending != Some(plan.token) {
                return Err(SessionError::StaleTurn {
                    got: plan.token,
                    expected: *pending,
                }
                .into());
            }
            *pending = None;
        }

        let interaction = self
            .store
            .append_interaction(&plan.user_text, assistant_text)
            .await?;

        if self.categorizer.options().auto_expand {
            for proposal in &plan.categorization.proposals {
                self.store
                    .add_keyword(&proposal.category, &proposal.keyword)
                    .await?;
                info!(
                    category = %proposal.category,
                    keyword = %proposal.keyword,
                    "keyword accepted"
                );
            }
        }

        for candidate in &plan.categorization.key_point_candidates {
            self.remember(&candidate.category, &candidate.text).await?;
        }

        Ok(interaction)
    }

    /// Store a fact, or reinforce it when the same fact (by normalized
    /// text) is already on record. Duplicate detection lives here, not
    /// in the store.
    async fn remember(&self, category: &str, text: &str) -> Result<()> {
        let normalized = normalize_text(text);
        let existing = self.store.list_key_points(category, usize::MAX).await?;
        match existing.iter().find(|kp| normalize_text(&kp.text) == normalized) {
            Some(kp) => {
                self.store.reinforce_key_point(&kp.id).await?;
                debug!(category, id = %kp.id, "key point reinforced");
            }
            None => {
                let kp = self.store.add_key_point(category, text).await?;
                info!(category, id = %kp.id, "key point recorded");
            }
        }
        Ok(())
    }
}
