// ============================================================
// Layer 4 — Sequence Dataset
// ============================================================
// One SeqSample per prediction point, wrapped in Burn's Dataset
// trait so DataLoaderBuilder can shuffle and batch it.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One next-item prediction example.
/// `item_seq` is left-padded to the model's max_seq_length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqSample {
    pub item_seq:     Vec<i64>,
    pub item_seq_len: usize,
    pub target:       i64,
}

impl SeqSample {
    /// The item that follows each position: item_seq shifted left
    /// by one with the target appended.
    pub fn next_item_targets(&self) -> Vec<i64> {
        let mut targets: Vec<i64> = self.item_seq.iter().skip(1).copied().collect();
        targets.push(self.target);
        targets
    }
}

pub struct SeqDataset {
    samples: Vec<SeqSample>,
}

impl SeqDataset {
    pub fn new(samples: Vec<SeqSample>) -> Self { Self { samples } }
}

impl Dataset<SeqSample> for SeqDataset {
    fn get(&self, index: usize) -> Option<SeqSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
