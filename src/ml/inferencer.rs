// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the trained model from the checkpoint directory and
// ranks the catalog for one interaction history.
//
//   train_config.json + item count → FmlpConfig → fresh model
//   model_epoch_<best>.mpk.gz      → weights loaded into it
//
// The history is truncated/left-padded exactly like training
// samples, and the padding item never appears in the results.

use anyhow::{bail, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use rand::{rngs::StdRng, SeedableRng};

use crate::data::{
    batcher::{SeqBatch, SeqBatcher},
    dataset::SeqSample,
    sequences::left_pad,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{model::FmlpRec, recommender::SequentialRecommender};

pub struct Inferencer<B: Backend> {
    model:  FmlpRec<B>,
    device: B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: FmlpRec<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    pub fn from_checkpoint(ckpt: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg   = ckpt.load_config()?;
        let vocab = ckpt.load_vocab()?;
        let model_cfg = cfg.model_config(vocab.item_size());

        // initial values are overwritten by the checkpoint
        let model: FmlpRec<B> = model_cfg.init(&device, &mut StdRng::seed_from_u64(cfg.seed))?;
        let model = ckpt.load_best(model, &device)?;
        tracing::info!("Model loaded from '{}'", ckpt.dir().display());
        Ok(Self::new(model, device))
    }

    pub fn item_size(&self) -> usize {
        self.model.item_size()
    }

    /// `history` holds dense ids, oldest first. Returns up to `k`
    /// (item id, score) pairs, best first, padding excluded.
    pub fn top_k(&self, history: &[i64], k: usize) -> Result<Vec<(i64, f32)>> {
        if history.is_empty() {
            bail!("Cannot recommend from an empty history");
        }

        let (item_seq, item_seq_len) = left_pad(history, self.model.config().max_seq_length);
        let sample = SeqSample { item_seq, item_seq_len, target: 0 };
        let batch: SeqBatch<B> = SeqBatcher.batch(vec![sample], &self.device);

        let scores: Vec<f32> = self
            .model
            .score_all(batch.item_seq, batch.item_seq_len)?
            .into_data()
            .iter::<f32>()
            .collect();

        let mut ranked: Vec<(i64, f32)> = scores
            .into_iter()
            .enumerate()
            .skip(1)
            .map(|(id, score)| (id as i64, score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        Ok(ranked)
    }
}
