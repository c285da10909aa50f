// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model math lives here, generic over the Burn backend.
//
// Model core, bottom-up:
//
//   params.rs        — seeded affine maps and lookup tables
//   dropout.rs       — dropout driven by an explicit StdRng
//   mask.rs          — causal + padding attention bias
//   filter.rs        — learned global filter (rfft → gain → irfft)
//   attention.rs     — multi-head self-attention
//   feed_forward.rs  — position-wise feed-forward sublayer
//   encoder.rs       — block stack with the token mixer variant
//   embedding.rs     — item + position embeddings, LayerNorm, dropout
//   loss.rs          — pairwise logistic loss over sampled negatives
//   model.rs         — FmlpRec, wiring the above together
//   recommender.rs   — the four-call interface hosts drive
//
// Host side:
//
//   trainer.rs       — Adam loop, validation, early stopping
//   evaluator.rs     — full-sort Hit / NDCG / MRR @ K
//   inferencer.rs    — checkpoint → top-K items
//
// Reference: Zhou et al. (2022) Filter-enhanced MLP is All You
//            Need for Sequential Recommendation
//            Kang & McAuley (2018) SASRec

/// Model errors
pub mod error;

/// Hyperparameters and their validation
pub mod config;

pub mod params;
pub mod dropout;
pub mod mask;
pub mod filter;
pub mod attention;
pub mod feed_forward;
pub mod encoder;
pub mod embedding;
pub mod loss;

/// FmlpRec model
pub mod model;

/// The encode / compute_loss / score_one / score_all interface
pub mod recommender;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Ranking metrics over the full catalog
pub mod evaluator;

/// Inference engine — loads checkpoint and ranks items
pub mod inferencer;
