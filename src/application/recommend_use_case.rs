// ============================================================
// Layer 2 — Recommend Use Case
// ============================================================
// Raw item tokens in, ranked raw item tokens out:
//
//   tokens ─► ItemVocab ids ─► Inferencer::top_k ─► tokens + scores
//
// Tokens the model never saw during training are skipped with
// a warning; a history with no known item is an error.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::data::vocab::ItemVocab;
use crate::domain::{interaction::ScoredItem, traits::Recommender};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct RecommendUseCase<B: Backend> {
    vocab:      ItemVocab,
    inferencer: Inferencer<B>,
}

impl<B: Backend> RecommendUseCase<B> {
    pub fn new(vocab: ItemVocab, inferencer: Inferencer<B>) -> Self {
        Self { vocab, inferencer }
    }

    pub fn from_checkpoint(checkpoint_dir: &str, device: B::Device) -> Result<Self> {
        let ckpt       = CheckpointManager::new(checkpoint_dir)?;
        let vocab      = ckpt.load_vocab()?;
        let inferencer = Inferencer::from_checkpoint(&ckpt, device)?;
        Ok(Self::new(vocab, inferencer))
    }

    fn history_ids(&self, history: &[String]) -> Vec<i64> {
        history
            .iter()
            .filter_map(|token| {
                let id = self.vocab.id(token);
                if id.is_none() {
                    tracing::warn!("Unknown item '{}' ignored", token);
                }
                id
            })
            .collect()
    }
}

impl<B: Backend> Recommender for RecommendUseCase<B> {
    fn recommend(&self, history: &[String], k: usize) -> Result<Vec<ScoredItem>> {
        let ids = self.history_ids(history);
        if ids.is_empty() {
            bail!("None of the {} history items are in the trained catalog", history.len());
        }

        let ranked = self.inferencer.top_k(&ids, k)?;
        Ok(ranked
            .into_iter()
            .filter_map(|(id, score)| {
                self.vocab.token(id).map(|item| ScoredItem { item: item.to_string(), score })
            })
            .collect())
    }
}
