// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop driving FmlpRec through the SequentialRecommender
// interface with Adam.
//
// Per training batch (DataLoader, reshuffled every epoch):
//   1. SeqBatcher stacks the samples
//   2. draw one negative per target position
//   3. loss = model.compute_loss(..)          (dropout on)
//   4. backward, Adam step
//
// Every `eval_step` epochs the model is ranked on the validation
// split (model.valid(): inner backend, dropout off). A better
// MRR@K saves a checkpoint; more than `stopping_step`
// evaluations without improvement stop the run. The best
// checkpoint is then reloaded and ranked on the test split.
//
// The run seed drives the loader's shuffling and one StdRng
// for model init, negatives and dropout, so a run is reproducible.
//
// Reference: Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{SeqBatch, SeqBatcher},
    dataset::{SeqDataset, SeqSample},
    negative_sampler::NegativeSampler,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    config::FmlpConfig,
    evaluator::{evaluate, RankingMetrics},
    model::FmlpRec,
    recommender::SequentialRecommender,
};

/// The three leave-one-out splits, ready for the loop.
pub struct TrainingData {
    pub train: SeqDataset,
    pub valid: SeqDataset,
    pub test:  SeqDataset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs_run: usize,
    pub best_epoch: usize,
    pub best_valid: RankingMetrics,
    pub test:       RankingMetrics,
}

/// Fixed-order loader for validation and test ranking.
fn eval_loader<B: Backend>(
    dataset:    SeqDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Arc<dyn DataLoader<B, SeqBatch<B>>> {
    DataLoaderBuilder::<B, SeqSample, SeqBatch<B>>::new(SeqBatcher)
        .batch_size(batch_size)
        .set_device(device.clone())
        .build(dataset)
}

pub fn run_training<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    model_cfg: &FmlpConfig,
    data:      TrainingData,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
    device:    B::Device,
) -> Result<TrainingReport> {
    tracing::info!("Training device: {:?}", device);
    ensure!(
        cfg.train_batch_size > 0 && cfg.eval_batch_size > 0,
        "Batch sizes must be positive (train={}, eval={})",
        cfg.train_batch_size, cfg.eval_batch_size
    );
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: FmlpRec<B> = model_cfg.init(&device, &mut rng)?;

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<B, FmlpRec<B>>();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::<B, SeqSample, SeqBatch<B>>::new(SeqBatcher)
        .batch_size(cfg.train_batch_size)
        .shuffle(cfg.seed)
        .set_device(device.clone())
        .build(data.train);

    // ── Evaluation data loaders (InnerBackend — no autodiff overhead) ─────────
    let valid_loader = eval_loader::<B::InnerBackend>(data.valid, cfg.eval_batch_size, &device);
    let test_loader  = eval_loader::<B::InnerBackend>(data.test, cfg.eval_batch_size, &device);

    let sampler = NegativeSampler::new(model_cfg.item_size);

    let mut best_mrr   = f64::NEG_INFINITY;
    let mut best_epoch = None;
    let mut best_valid = RankingMetrics::default();
    let mut stale      = 0usize;
    let mut epochs_run = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        epochs_run = epoch;

        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let negatives = sampler.sample_batch(&batch.next_items, &mut rng);
            let loss = model.compute_loss(batch.item_seq, batch.target, negatives, &mut rng)?;
            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
        tracing::debug!("Epoch {} finished {} batches", epoch, batches);

        if cfg.eval_step == 0 || epoch % cfg.eval_step != 0 {
            println!("Epoch {:>3}/{} | train_loss={:.4}", epoch, cfg.epochs, train_loss);
            continue;
        }

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → FmlpRec<B::InnerBackend>, no autodiff graph
        let valid = evaluate(&model.valid(), valid_loader.as_ref(), cfg.topk)?;
        let row = EpochMetrics::new(epoch, train_loss, valid);
        metrics.log(&row)?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | hit@{k}={:.4} | ndcg@{k}={:.4} | mrr@{k}={:.4}",
            epoch, cfg.epochs, train_loss, valid.hit, valid.ndcg, valid.mrr,
            k = cfg.topk,
        );

        if row.is_improvement(best_mrr) {
            best_mrr   = valid.mrr;
            best_epoch = Some(epoch);
            best_valid = valid;
            stale      = 0;
            ckpt.save_best(&model, epoch)?;
            tracing::info!("New best model at epoch {} (mrr@{}={:.4})", epoch, cfg.topk, valid.mrr);
        } else {
            stale += 1;
            if stale > cfg.stopping_step {
                tracing::info!(
                    "Early stopping at epoch {}: no improvement for {} evaluations",
                    epoch, stale
                );
                break;
            }
        }
    }

    // Never evaluated: keep the final weights as the selected model.
    let best_epoch = match best_epoch {
        Some(epoch) => epoch,
        None => {
            ckpt.save_best(&model, epochs_run)?;
            epochs_run
        }
    };

    // ── Test phase ────────────────────────────────────────────────────────────
    let best_model = ckpt.load_best(model.valid(), &device)?;
    let test = evaluate(&best_model, test_loader.as_ref(), cfg.topk)?;
    tracing::info!(
        "Test (best epoch {}): hit@{k}={:.4} ndcg@{k}={:.4} mrr@{k}={:.4}",
        best_epoch, test.hit, test.ndcg, test.mrr,
        k = cfg.topk,
    );

    Ok(TrainingReport { epochs_run, best_epoch, best_valid, test })
}
