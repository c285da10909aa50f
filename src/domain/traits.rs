// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, not to the
// concrete loader or model, so a different file format or a
// different recommender only needs a new implementation.

use anyhow::Result;

use crate::domain::interaction::{Interaction, ScoredItem};

// ─── InteractionSource ────────────────────────────────────────────────────────
/// Anything that can produce the full interaction log of a dataset.
///
/// Implementations:
///   - AtomicFileLoader → tab separated `.inter` files
pub trait InteractionSource {
    /// Load every interaction, in source order.
    fn load_all(&self) -> Result<Vec<Interaction>>;
}

// ─── Recommender ──────────────────────────────────────────────────────────────
/// Anything that can rank catalog items for an interaction history.
///
/// Implementations:
///   - RecommendUseCase → the trained FMLP model
pub trait Recommender {
    /// `history` holds raw item tokens, oldest first.
    /// Returns at most `k` items, best first.
    fn recommend(&self, history: &[String], k: usize) -> Result<Vec<ScoredItem>>;
}
