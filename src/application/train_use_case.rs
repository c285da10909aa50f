// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the interaction log        (Layer 4 - data)
//   Step 2: Build the item vocabulary       (Layer 4 - data)
//   Step 3: Group per-user histories        (Layer 4 - data)
//   Step 4: Leave-one-out split             (Layer 4 - data)
//   Step 5: Build and validate model config (Layer 5 - ml)
//   Step 6: Save config + vocabulary        (Layer 6 - infra)
//   Step 7: Run the training loop           (Layer 5 - ml)

use std::path::PathBuf;

use anyhow::{bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::BackendKind;
use crate::data::{
    dataset::SeqDataset,
    loader::AtomicFileLoader,
    sequences::group_histories,
    splitter::leave_one_out,
    vocab::ItemVocab,
};
use crate::domain::traits::InteractionSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    config::{Activation, FmlpConfig, LossType, TokenMixerKind},
    trainer::{run_training, TrainingData, TrainingReport},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs: where the data is, how to train, and the
// model hyperparameters. Saved next to the checkpoints so the
// recommender can rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub dataset:        String,
    pub checkpoint_dir: String,
    pub backend:        BackendKind,

    pub epochs:           usize,
    pub train_batch_size: usize,
    pub eval_batch_size:  usize,
    pub learning_rate:    f64,
    /// Evaluate on the validation split every `eval_step` epochs.
    pub eval_step:        usize,
    /// Stop after this many evaluations without improvement.
    pub stopping_step:    usize,
    /// Cut-off K of Hit@K, NDCG@K and MRR@K.
    pub topk:             usize,
    pub seed:             u64,

    pub max_seq_length:      usize,
    pub hidden_size:         usize,
    pub n_layers:            usize,
    pub n_heads:             usize,
    pub hidden_dropout_prob: f64,
    pub attn_dropout_prob:   f64,
    pub hidden_act:          Activation,
    pub initializer_range:   f64,
    pub token_mixer:         TokenMixerKind,
    pub loss_type:           LossType,
    pub mask_padded_targets: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "dataset".to_string(),
            dataset:        "ml-100k".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            backend:        BackendKind::Ndarray,

            epochs:           60,
            train_batch_size: 256,
            eval_batch_size:  512,
            learning_rate:    1e-4,
            eval_step:        1,
            stopping_step:    301,
            topk:             10,
            seed:             3232,

            max_seq_length:      50,
            hidden_size:         128,
            n_layers:            4,
            n_heads:             2,
            hidden_dropout_prob: 0.5,
            attn_dropout_prob:   0.5,
            hidden_act:          Activation::Gelu,
            initializer_range:   0.02,
            token_mixer:         TokenMixerKind::Filter,
            loss_type:           LossType::Ce,
            mask_padded_targets: false,
        }
    }
}

impl TrainConfig {
    /// Model hyperparameters for a catalog of `item_size` ids (padding included).
    pub fn model_config(&self, item_size: usize) -> FmlpConfig {
        FmlpConfig::new(item_size)
            .with_hidden_size(self.hidden_size)
            .with_num_hidden_layers(self.n_layers)
            .with_num_attention_heads(self.n_heads)
            .with_hidden_act(self.hidden_act)
            .with_hidden_dropout_prob(self.hidden_dropout_prob)
            .with_attention_probs_dropout_prob(self.attn_dropout_prob)
            .with_initializer_range(self.initializer_range)
            .with_max_seq_length(self.max_seq_length)
            .with_token_mixer(self.token_mixer)
            .with_loss_type(self.loss_type)
            .with_mask_padded_targets(self.mask_padded_targets)
    }

    pub fn interaction_path(&self) -> PathBuf {
        AtomicFileLoader::for_dataset(&self.data_dir, &self.dataset).path().to_path_buf()
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline on the configured backend.
    pub fn execute(&self) -> Result<TrainingReport> {
        match self.config.backend {
            BackendKind::Ndarray => self.execute_on::<Autodiff<NdArray>>(NdArrayDevice::default()),
            BackendKind::Wgpu    => self.execute_on::<Autodiff<Wgpu>>(WgpuDevice::default()),
        }
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainingReport> {
        let cfg = &self.config;

        // ── Step 1: Load the interaction log ──────────────────────────────────
        let loader = AtomicFileLoader::for_dataset(&cfg.data_dir, &cfg.dataset);
        tracing::info!("Loading interactions from '{}'", loader.path().display());
        let interactions = loader.load_all()?;

        // ── Step 2: Item vocabulary ───────────────────────────────────────────
        let vocab = ItemVocab::build(&interactions);
        if vocab.is_empty() {
            bail!("'{}' contains no interactions", loader.path().display());
        }

        // ── Step 3: Per-user histories ────────────────────────────────────────
        let histories = group_histories(&interactions, &vocab);
        tracing::info!(
            "Dataset '{}': {} users, {} items, {} interactions",
            cfg.dataset,
            histories.len(),
            vocab.len(),
            interactions.len(),
        );

        // ── Step 4: Leave-one-out split ───────────────────────────────────────
        let split = leave_one_out(&histories, cfg.max_seq_length);
        tracing::info!(
            "Split: {} train, {} valid, {} test samples",
            split.train.len(),
            split.valid.len(),
            split.test.len(),
        );
        if split.train.is_empty() {
            bail!("No training samples: every user needs at least three interactions");
        }

        // ── Step 5: Model configuration ───────────────────────────────────────
        // Fail on bad hyperparameters before anything is written to disk
        let model_cfg = cfg.model_config(vocab.item_size());
        model_cfg.validate()?;

        // ── Step 6: Save config and vocabulary for inference ──────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(cfg)?;
        ckpt.save_vocab(&vocab)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 7: Training loop (Layer 5) ───────────────────────────────────
        let data = TrainingData {
            train: SeqDataset::new(split.train),
            valid: SeqDataset::new(split.valid),
            test:  SeqDataset::new(split.test),
        };
        run_training::<B>(cfg, &model_cfg, data, &ckpt, &metrics, device)
    }
}
