// ============================================================
// Layer 5 — Seeded Dropout
// ============================================================
// Inverted dropout whose masks come from an explicit StdRng.
//
//   rng = Some(..) → training: zero each element with
//                    probability p, scale survivors by 1/(1-p)
//   rng = None     → inference: identity
//
// Passing the random source in, rather than reading a global
// seed, keeps every training step reproducible from one seed.

use burn::prelude::*;
use rand::{rngs::StdRng, Rng};

#[derive(Module, Clone, Debug)]
pub struct SeededDropout {
    pub prob: f64,
}

impl SeededDropout {
    pub fn new(prob: f64) -> Self {
        Self { prob }
    }

    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
        rng:   Option<&mut StdRng>,
    ) -> Tensor<B, D> {
        let rng = match rng {
            Some(rng) if self.prob > 0.0 => rng,
            _ => return input,
        };

        let shape = input.shape();
        let keep  = 1.0 - self.prob;
        let scale = (1.0 / keep) as f32;
        let mask: Vec<f32> = (0..shape.num_elements())
            .map(|_| if rng.gen::<f64>() < keep { scale } else { 0.0 })
            .collect();
        let mask = Tensor::<B, 1>::from_floats(mask.as_slice(), &input.device()).reshape(shape);
        input * mask
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::SeedableRng;

    type TestBackend = NdArray<f32>;

    fn ones(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        Tensor::ones([40, 50], device)
    }

    #[test]
    fn test_identity_without_rng() {
        let device = Default::default();
        let out: Vec<f32> = SeededDropout::new(0.5)
            .forward(ones(&device), None)
            .into_data().to_vec().unwrap();
        assert!(out.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_zero_probability_is_identity() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(0);
        let out: Vec<f32> = SeededDropout::new(0.0)
            .forward(ones(&device), Some(&mut rng))
            .into_data().to_vec().unwrap();
        assert!(out.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_mask_is_reproducible_and_scaled() {
        let device = Default::default();
        let dropout = SeededDropout::new(0.5);

        let a: Vec<f32> = dropout
            .forward(ones(&device), Some(&mut StdRng::seed_from_u64(11)))
            .into_data().to_vec().unwrap();
        let b: Vec<f32> = dropout
            .forward(ones(&device), Some(&mut StdRng::seed_from_u64(11)))
            .into_data().to_vec().unwrap();
        assert_eq!(a, b);

        assert!(a.iter().all(|&v| v == 0.0 || v == 2.0));
        let dropped = a.iter().filter(|&&v| v == 0.0).count() as f64 / a.len() as f64;
        assert!((0.4..0.6).contains(&dropped), "dropped fraction {dropped}");
    }
}
