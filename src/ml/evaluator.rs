// ============================================================
// Layer 5 — Full-Sort Ranking Evaluator
// ============================================================
// Every sample is scored against the whole catalog through
// `score_all`; the padding item 0 never competes.
//
//   rank   = #{ j ≥ 1, j ≠ target : score_j > score_target }
//   Hit@K  = 1                  if rank < K
//   NDCG@K = 1 / log2(rank + 2) if rank < K
//   MRR@K  = 1 / (rank + 1)     if rank < K
//
// Ties count in the target's favour. Metrics are averaged over
// evaluated samples.

use burn::{data::dataloader::DataLoader, prelude::*};
use serde::{Deserialize, Serialize};

use crate::data::batcher::SeqBatch;
use crate::ml::{
    error::{ModelError, ModelResult},
    recommender::SequentialRecommender,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub hit:   f64,
    pub ndcg:  f64,
    pub mrr:   f64,
    /// Samples averaged over.
    pub count: usize,
}

/// 0-based rank of `target` among items 1.. of `scores`.
pub fn rank_of_target(scores: &[f32], target: usize) -> usize {
    let target_score = scores[target];
    scores
        .iter()
        .enumerate()
        .skip(1)
        .filter(|&(j, &s)| j != target && s > target_score)
        .count()
}

/// Running sums for one evaluation pass.
#[derive(Debug, Clone)]
pub struct MetricAccumulator {
    k:     usize,
    hit:   f64,
    ndcg:  f64,
    mrr:   f64,
    count: usize,
}

impl MetricAccumulator {
    pub fn new(k: usize) -> Self {
        Self { k, hit: 0.0, ndcg: 0.0, mrr: 0.0, count: 0 }
    }

    pub fn add_rank(&mut self, rank: usize) {
        self.count += 1;
        if rank < self.k {
            self.hit  += 1.0;
            self.ndcg += 1.0 / ((rank + 2) as f64).log2();
            self.mrr  += 1.0 / (rank + 1) as f64;
        }
    }

    pub fn finish(&self) -> RankingMetrics {
        if self.count == 0 {
            return RankingMetrics::default();
        }
        let n = self.count as f64;
        RankingMetrics {
            hit:   self.hit / n,
            ndcg:  self.ndcg / n,
            mrr:   self.mrr / n,
            count: self.count,
        }
    }
}

/// Rank every target the loader yields with `model`.
pub fn evaluate<B, M>(
    model:  &M,
    loader: &dyn DataLoader<B, SeqBatch<B>>,
    k:      usize,
) -> ModelResult<RankingMetrics>
where
    B: Backend,
    M: SequentialRecommender<B>,
{
    if k == 0 {
        return Err(ModelError::InvalidConfig("evaluation needs k > 0".into()));
    }

    let mut acc = MetricAccumulator::new(k);

    for batch in loader.iter() {
        let targets: Vec<i64> = batch.target.into_data().iter::<i64>().collect();
        let scores = model.score_all(batch.item_seq, batch.item_seq_len)?;
        let [_, width] = scores.dims();
        let flat: Vec<f32> = scores.into_data().iter::<f32>().collect();

        for (row, &target) in flat.chunks(width).zip(&targets) {
            acc.add_rank(rank_of_target(row, target as usize));
        }
    }

    let metrics = acc.finish();
    tracing::debug!(
        "Evaluated {} samples: hit@{k}={:.4} ndcg@{k}={:.4} mrr@{k}={:.4}",
        metrics.count,
        metrics.hit,
        metrics.ndcg,
        metrics.mrr,
    );
    Ok(metrics)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::SeqBatcher, dataset::{SeqDataset, SeqSample}};
    use crate::ml::config::FmlpConfig;
    use burn::backend::NdArray;
    use burn::data::dataloader::DataLoaderBuilder;
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_rank_ignores_padding_and_counts_strictly_higher() {
        // padding scores highest but never counts
        let scores = [9.0, 0.1, 0.5, 0.5, 0.7];
        assert_eq!(rank_of_target(&scores, 4), 0);
        assert_eq!(rank_of_target(&scores, 2), 1);
        assert_eq!(rank_of_target(&scores, 3), 1);
        assert_eq!(rank_of_target(&scores, 1), 3);
    }

    #[test]
    fn test_metric_values() {
        let mut acc = MetricAccumulator::new(2);
        acc.add_rank(0);
        acc.add_rank(1);
        acc.add_rank(5);
        acc.add_rank(0);
        let m = acc.finish();

        assert_eq!(m.count, 4);
        assert!((m.hit - 0.75).abs() < 1e-12);
        assert!((m.mrr - (1.0 + 0.5 + 1.0) / 4.0).abs() < 1e-12);
        let ndcg = (1.0 + 1.0 / 3f64.log2() + 1.0) / 4.0;
        assert!((m.ndcg - ndcg).abs() < 1e-12);
    }

    #[test]
    fn test_empty_evaluation_is_zero() {
        assert_eq!(MetricAccumulator::new(10).finish(), RankingMetrics::default());
    }

    #[test]
    fn test_evaluate_over_batches() {
        let device = Default::default();
        let cfg = FmlpConfig::new(9).with_hidden_size(8).with_max_seq_length(3);
        let model = cfg.init::<TestBackend>(&device, &mut StdRng::seed_from_u64(1)).unwrap();

        let loader = |batch_size: usize| {
            let samples: Vec<SeqSample> = (1..=5)
                .map(|t| SeqSample { item_seq: vec![0, 2, 3], item_seq_len: 2, target: t })
                .collect();
            DataLoaderBuilder::<TestBackend, SeqSample, SeqBatch<TestBackend>>::new(SeqBatcher)
                .batch_size(batch_size)
                .build(SeqDataset::new(samples))
        };

        // k covers the whole catalog, so every target is a hit
        let all = evaluate(&model, loader(2).as_ref(), 8).unwrap();
        assert_eq!(all.count, 5);
        assert!((all.hit - 1.0).abs() < 1e-12);

        let top1 = evaluate(&model, loader(4).as_ref(), 1).unwrap();
        assert!(top1.hit <= 0.2 + 1e-12);
        assert!(evaluate(&model, loader(2).as_ref(), 0).is_err());
    }
}
