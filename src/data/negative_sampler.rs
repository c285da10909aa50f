// ============================================================
// Layer 4 — Negative Sampler
// ============================================================
// One negative item per positive target, drawn uniformly from
// the real catalog [1, item_size). A draw that equals its
// positive is redrawn, up to MAX_ATTEMPTS times; after that the
// last draw is kept so a degenerate one-item catalog cannot
// loop forever.
//
// Padding targets (0) get a negative too. Whether they count
// toward the loss is the loss function's decision.

use burn::prelude::*;
use rand::{rngs::StdRng, Rng};

const MAX_ATTEMPTS: usize = 10;

#[derive(Clone, Debug)]
pub struct NegativeSampler {
    item_size: usize,
}

impl NegativeSampler {
    /// `item_size` counts the padding id, so it must be at least 2.
    pub fn new(item_size: usize) -> Self {
        Self { item_size }
    }

    pub fn sample_one(&self, positive: i64, rng: &mut StdRng) -> i64 {
        let upper = self.item_size.max(2) as i64;
        let mut draw = rng.gen_range(1..upper);
        for _ in 1..MAX_ATTEMPTS {
            if draw != positive {
                break;
            }
            draw = rng.gen_range(1..upper);
        }
        draw
    }

    /// Same length as `positives`, element-wise.
    pub fn sample_like(&self, positives: &[i64], rng: &mut StdRng) -> Vec<i64> {
        positives.iter().map(|&p| self.sample_one(p, rng)).collect()
    }

    /// One negative per entry of `next_items` [batch, len], returned
    /// with the same shape on the same device.
    pub fn sample_batch<B: Backend>(&self, next_items: &Tensor<B, 2, Int>, rng: &mut StdRng) -> Tensor<B, 2, Int> {
        let dims = next_items.dims();
        let positives: Vec<i64> = next_items.to_data().iter::<i64>().collect();
        let negatives = self.sample_like(&positives, rng);
        Tensor::<B, 1, Int>::from_ints(negatives.as_slice(), &next_items.device()).reshape(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::SeedableRng;

    #[test]
    fn test_never_padding_never_positive() {
        let sampler = NegativeSampler::new(6);
        let mut rng = StdRng::seed_from_u64(1);
        let positives: Vec<i64> = (0..300).map(|i| i % 6).collect();
        let negatives = sampler.sample_like(&positives, &mut rng);

        assert_eq!(negatives.len(), positives.len());
        for (p, n) in positives.iter().zip(&negatives) {
            assert!((1..6).contains(n));
            assert_ne!(p, n);
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let sampler = NegativeSampler::new(100);
        let a = sampler.sample_like(&[1, 2, 3, 4], &mut StdRng::seed_from_u64(9));
        let b = sampler.sample_like(&[1, 2, 3, 4], &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_keeps_shape_and_avoids_positives() {
        let device = Default::default();
        let next = Tensor::<NdArray<f32>, 1, Int>::from_ints([0, 3, 4, 1, 2, 5], &device).reshape([2, 3]);
        let negatives = NegativeSampler::new(6).sample_batch(&next, &mut StdRng::seed_from_u64(3));
        assert_eq!(negatives.dims(), [2, 3]);

        let negatives: Vec<i64> = negatives.into_data().to_vec().unwrap();
        for (p, n) in [0, 3, 4, 1, 2, 5].iter().zip(&negatives) {
            assert!((1..6).contains(n));
            assert_ne!(p, n);
        }
    }

    #[test]
    fn test_single_item_catalog_terminates() {
        let sampler = NegativeSampler::new(2);
        assert_eq!(sampler.sample_one(1, &mut StdRng::seed_from_u64(0)), 1);
    }
}
