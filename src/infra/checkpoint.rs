// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// What lives in the checkpoint directory:
//
//   checkpoints/
//     model_epoch_3.mpk.gz   ← weights whenever validation improved
//     best_epoch.json        ← epoch of the best validation score
//     train_config.json      ← run + model hyperparameters
//     item_vocab.json        ← item tokens, position i = id i + 1
//
// The config and vocabulary are needed to rebuild a model of
// the right shape before the weights are loaded into it;
// CompactRecorder refuses a record whose shapes do not match.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::vocab::ItemVocab;
use crate::ml::model::FmlpRec;

const BEST_EPOCH_FILE:   &str = "best_epoch.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";
const VOCAB_FILE:        &str = "item_vocab.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        // the recorder appends its own extension
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    // ─── Model weights ────────────────────────────────────────────────────────

    /// Save weights for `epoch` and point best_epoch.json at it.
    pub fn save_best<B: Backend>(&self, model: &FmlpRec<B>, epoch: usize) -> Result<()> {
        let path = self.model_path(epoch);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let pointer = self.dir.join(BEST_EPOCH_FILE);
        fs::write(&pointer, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", pointer.display()))?;

        tracing::debug!("Saved checkpoint for epoch {}", epoch);
        Ok(())
    }

    /// Load the weights of the best epoch into `model`.
    pub fn load_best<B: Backend>(&self, model: FmlpRec<B>, device: &B::Device) -> Result<FmlpRec<B>> {
        let epoch = self.best_epoch()?;
        let path  = self.model_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?", path.display())
            })?;
        Ok(model.load_record(record))
    }

    pub fn best_epoch(&self) -> Result<usize> {
        let path = self.dir.join(BEST_EPOCH_FILE);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    // ─── Run configuration ────────────────────────────────────────────────────

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(TRAIN_CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(TRAIN_CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'recommend'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    // ─── Item vocabulary ──────────────────────────────────────────────────────

    pub fn save_vocab(&self, vocab: &ItemVocab) -> Result<()> {
        let path = self.dir.join(VOCAB_FILE);
        fs::write(&path, serde_json::to_string(vocab.tokens())?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_vocab(&self) -> Result<ItemVocab> {
        let path = self.dir.join(VOCAB_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read vocabulary from '{}'", path.display()))?;
        let tokens: Vec<String> = serde_json::from_str(&json)?;
        Ok(ItemVocab::from_tokens(tokens))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interaction::Interaction;
    use crate::ml::{config::FmlpConfig, recommender::SequentialRecommender};
    use burn::backend::NdArray;
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_config_and_vocab_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("nested")).unwrap();

        let cfg = TrainConfig { epochs: 3, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap().epochs, 3);

        let vocab = ItemVocab::build(&[Interaction::new("u", "a", None), Interaction::new("u", "b", None)]);
        ckpt.save_vocab(&vocab).unwrap();
        assert_eq!(ckpt.load_vocab().unwrap(), vocab);
    }

    #[test]
    fn test_best_weights_restore_scores() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let cfg    = FmlpConfig::new(7).with_hidden_size(4).with_max_seq_length(3);

        let trained = cfg.init::<TestBackend>(&device, &mut StdRng::seed_from_u64(1)).unwrap();
        ckpt.save_best(&trained, 4).unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), 4);

        let fresh  = cfg.init::<TestBackend>(&device, &mut StdRng::seed_from_u64(2)).unwrap();
        let loaded = ckpt.load_best(fresh, &device).unwrap();

        let seq  = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 2], &device).reshape([1, 3]);
        let lens = Tensor::<TestBackend, 1, Int>::from_ints([2], &device);
        let a: Vec<f32> = trained.score_all(seq.clone(), lens.clone()).unwrap().into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.score_all(seq, lens).unwrap().into_data().to_vec().unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(ckpt.best_epoch().is_err());
        assert!(ckpt.load_config().is_err());
    }
}
