// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a raw interaction file to tensor batches.
//
//   dataset/<name>/<name>.inter
//       │
//       ▼
//   AtomicFileLoader  → parses the tab separated log
//       │
//       ▼
//   ItemVocab         → raw item tokens → dense ids 1..=n (0 = padding)
//       │
//       ▼
//   group_histories   → one time-ordered id list per user
//       │
//       ▼
//   leave_one_out     → train / valid / test samples, left-padded
//       │
//       ▼
//   SeqDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   SeqBatcher        → Burn Batcher: samples → Int tensors (DataLoader)
//
// Negative items for the training loss are drawn per batch by
// NegativeSampler.

/// Reads `.inter` atomic files
pub mod loader;

/// Item token ↔ dense id mapping
pub mod vocab;

/// Per-user histories and next-item samples
pub mod sequences;

/// Leave-one-out train/valid/test split
pub mod splitter;

/// Implements Burn's Dataset trait for sequence samples
pub mod dataset;

/// Turns sample slices into tensor batches
pub mod batcher;

/// Uniform negative items for the pairwise loss
pub mod negative_sampler;
