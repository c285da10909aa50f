// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait: the DataLoader hands it each
// mini-batch of SeqSamples and it stacks them into Int tensors
// on the requested device.
//
//   Input:  N samples, each item_seq of length T
//   Output: item_seq [N, T], item_seq_len [N], target [N],
//           next_items [N, T]
//
// Every item_seq is already padded to the same length, so the
// flat buffer reshapes straight to [N, T].

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::SeqSample;

// ─── SeqBatch ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct SeqBatch<B: Backend> {
    /// Left-padded histories — shape: [batch_size, seq_len]
    pub item_seq: Tensor<B, 2, Int>,

    /// Count of real items per row — shape: [batch_size]
    pub item_seq_len: Tensor<B, 1, Int>,

    /// The true next item — shape: [batch_size]
    pub target: Tensor<B, 1, Int>,

    /// The item following each position (item_seq shifted left,
    /// target appended) — shape: [batch_size, seq_len]
    pub next_items: Tensor<B, 2, Int>,
}

// ─── SeqBatcher ───────────────────────────────────────────────────────────────
/// Stateless: the device comes from the DataLoader.
#[derive(Clone, Debug, Default)]
pub struct SeqBatcher;

impl<B: Backend> Batcher<B, SeqSample, SeqBatch<B>> for SeqBatcher {
    fn batch(&self, items: Vec<SeqSample>, device: &B::Device) -> SeqBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |s| s.item_seq.len());

        let seq_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.item_seq.iter().copied())
            .collect();
        let next_flat: Vec<i64> = items
            .iter()
            .flat_map(SeqSample::next_item_targets)
            .collect();
        let lens: Vec<i64>    = items.iter().map(|s| s.item_seq_len as i64).collect();
        let targets: Vec<i64> = items.iter().map(|s| s.target).collect();

        let ints = |values: &[i64]| Tensor::<B, 1, Int>::from_ints(values, device);

        SeqBatch {
            item_seq:     ints(&seq_flat).reshape([batch_size, seq_len]),
            item_seq_len: ints(&lens),
            target:       ints(&targets),
            next_items:   ints(&next_flat).reshape([batch_size, seq_len]),
        }
    }
}
