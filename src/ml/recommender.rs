// ============================================================
// Layer 5 — Sequential Recommender Interface
// ============================================================
// The narrow surface a training/evaluation host drives. Nothing
// here knows about datasets, optimisers or checkpoints; the host
// owns those and calls into the model through these four methods.

use burn::prelude::*;
use rand::rngs::StdRng;

use crate::ml::error::ModelResult;

pub trait SequentialRecommender<B: Backend> {
    /// item_seq [batch, len], item_seq_len [batch] → [batch, len, hidden]
    ///
    /// `rng = None` disables dropout.
    fn encode(
        &self,
        item_seq:     Tensor<B, 2, Int>,
        item_seq_len: Tensor<B, 1, Int>,
        rng:          Option<&mut StdRng>,
    ) -> ModelResult<Tensor<B, 3>>;

    /// Pairwise ranking loss of one training batch. Always runs with dropout.
    ///
    /// next_items [batch]; negatives [batch, len], one per target position.
    fn compute_loss(
        &self,
        item_seq:   Tensor<B, 2, Int>,
        next_items: Tensor<B, 1, Int>,
        negatives:  Tensor<B, 2, Int>,
        rng:        &mut StdRng,
    ) -> ModelResult<Tensor<B, 1>>;

    /// One candidate per sequence → [batch]
    fn score_one(
        &self,
        item_seq:     Tensor<B, 2, Int>,
        item_seq_len: Tensor<B, 1, Int>,
        candidates:   Tensor<B, 1, Int>,
    ) -> ModelResult<Tensor<B, 1>>;

    /// Every catalog item, padding included → [batch, item_size]
    fn score_all(
        &self,
        item_seq:     Tensor<B, 2, Int>,
        item_seq_len: Tensor<B, 1, Int>,
    ) -> ModelResult<Tensor<B, 2>>;
}
