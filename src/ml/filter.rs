// ============================================================
// Layer 5 — Global Filter (token mixing in frequency space)
// ============================================================
// The filter-enhanced block replaces self-attention with a
// learned per-frequency, per-channel complex gain:
//
//   X = rfft(x, over positions, orthonormal)      [batch, F, hidden]
//   Y = X ⊙ W                                     W: [F, hidden] complex
//   y = irfft(Y, n = len, orthonormal)            [batch, len, hidden]
//
// with F = len/2 + 1. Both transforms are written as real matrix
// products so they run on every backend and differentiate
// through autodiff like any other matmul:
//
//   Re X = Cf · x          Cf[k,t] =  cos(2πkt/len) / √len
//   Im X = Sf · x          Sf[k,t] = -sin(2πkt/len) / √len
//   y    = Ci · Re Y + Si · Im Y
//          Ci[t,k] =  c_k cos(2πkt/len) / √len
//          Si[t,k] = -c_k sin(2πkt/len) / √len
//
// where c_k = 1 for the DC bin and (even len) the Nyquist bin,
// 2 otherwise. The filter sees the whole sequence at once, so
// it does not consume the causal mask.
//
// Output: LayerNorm(dropout(y) + x)

use std::f64::consts::PI;

use burn::{
    module::Param,
    nn::{LayerNorm, LayerNormConfig},
    prelude::*,
};
use rand::rngs::StdRng;

use crate::ml::{dropout::SeededDropout, error::ModelResult, params::normal_tensor};

/// Fixed std of the complex filter initialiser, independent of initializer_range.
pub const FILTER_INIT_STD: f64 = 0.02;

/// Number of rfft bins for a sequence of `len` positions.
pub fn frequency_bins(len: usize) -> usize {
    len / 2 + 1
}

/// Host-side DFT matrices for one sequence length.
struct SpectralBasis {
    len:         usize,
    bins:        usize,
    forward_cos: Vec<f32>, // [bins, len]
    forward_sin: Vec<f32>, // [bins, len]
    inverse_cos: Vec<f32>, // [len, bins]
    inverse_sin: Vec<f32>, // [len, bins]
}

impl SpectralBasis {
    fn new(len: usize) -> Self {
        let bins = frequency_bins(len);
        let norm = 1.0 / (len as f64).sqrt();

        let mut forward_cos = vec![0.0f32; bins * len];
        let mut forward_sin = vec![0.0f32; bins * len];
        let mut inverse_cos = vec![0.0f32; len * bins];
        let mut inverse_sin = vec![0.0f32; len * bins];

        for k in 0..bins {
            let nyquist = len % 2 == 0 && k == len / 2;
            let weight  = if k == 0 || nyquist { 1.0 } else { 2.0 };
            for t in 0..len {
                // reduce kt mod len first so the angle stays in [0, 2π)
                let angle = 2.0 * PI * ((k * t) % len) as f64 / len as f64;
                let (sin, cos) = angle.sin_cos();
                forward_cos[k * len + t]  = (cos * norm) as f32;
                forward_sin[k * len + t]  = (-sin * norm) as f32;
                inverse_cos[t * bins + k] = (weight * cos * norm) as f32;
                inverse_sin[t * bins + k] = (-weight * sin * norm) as f32;
            }
        }

        Self { len, bins, forward_cos, forward_sin, inverse_cos, inverse_sin }
    }

    fn matrix<B: Backend>(
        data:   &[f32],
        rows:   usize,
        cols:   usize,
        batch:  usize,
        device: &B::Device,
    ) -> Tensor<B, 3> {
        Tensor::<B, 1>::from_floats(data, device)
            .reshape([1, rows, cols])
            .expand([batch, rows, cols])
    }
}

/// Multiply the orthonormal rfft of `input` along positions by the complex
/// gain (`gain_re`, `gain_im`, each [bins, hidden]) and transform back.
///
/// input [batch, len, hidden] → [batch, len, hidden]
pub fn spectral_mix<B: Backend>(
    input:   Tensor<B, 3>,
    gain_re: Tensor<B, 2>,
    gain_im: Tensor<B, 2>,
) -> Tensor<B, 3> {
    let [batch, len, hidden] = input.dims();
    let device = input.device();
    let basis  = SpectralBasis::new(len);
    let bins   = basis.bins;

    let fwd_cos = SpectralBasis::matrix::<B>(&basis.forward_cos, bins, basis.len, batch, &device);
    let fwd_sin = SpectralBasis::matrix::<B>(&basis.forward_sin, bins, basis.len, batch, &device);
    let inv_cos = SpectralBasis::matrix::<B>(&basis.inverse_cos, basis.len, bins, batch, &device);
    let inv_sin = SpectralBasis::matrix::<B>(&basis.inverse_sin, basis.len, bins, batch, &device);

    let spec_re = fwd_cos.matmul(input.clone()); // [batch, bins, hidden]
    let spec_im = fwd_sin.matmul(input);

    let gain_re = gain_re.reshape([1, bins, hidden]);
    let gain_im = gain_im.reshape([1, bins, hidden]);

    let out_re = spec_re.clone() * gain_re.clone() - spec_im.clone() * gain_im.clone();
    let out_im = spec_re * gain_im + spec_im * gain_re;

    inv_cos.matmul(out_re) + inv_sin.matmul(out_im)
}

// ─── GlobalFilter ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct GlobalFilter<B: Backend> {
    /// Shape [bins, hidden, 2]: real and imaginary gain per frequency and channel.
    pub complex_weight: Param<Tensor<B, 3>>,
    pub dropout:        SeededDropout,
    pub layer_norm:     LayerNorm<B>,
}

impl<B: Backend> GlobalFilter<B> {
    pub fn new(
        max_seq_length: usize,
        hidden_size:    usize,
        dropout_prob:   f64,
        rng:            &mut StdRng,
        device:         &B::Device,
    ) -> ModelResult<Self> {
        let bins   = frequency_bins(max_seq_length);
        let weight = normal_tensor([bins, hidden_size, 2], FILTER_INIT_STD, rng, device)?;
        Ok(Self {
            complex_weight: Param::from_tensor(weight),
            dropout:        SeededDropout::new(dropout_prob),
            layer_norm:     LayerNormConfig::new(hidden_size).with_epsilon(1e-12).init(device),
        })
    }

    /// Number of frequency bins the learned gain covers.
    pub fn frequency_count(&self) -> usize {
        self.complex_weight.val().dims()[0]
    }

    /// input [batch, len, hidden] → [batch, len, hidden]
    /// `len` must produce exactly `frequency_count()` bins; the model checks this.
    pub fn forward(&self, input: Tensor<B, 3>, rng: Option<&mut StdRng>) -> Tensor<B, 3> {
        let [bins, hidden, _] = self.complex_weight.val().dims();
        let weight  = self.complex_weight.val();
        let gain_re = weight.clone().slice([0..bins, 0..hidden, 0..1]).reshape([bins, hidden]);
        let gain_im = weight.slice([0..bins, 0..hidden, 1..2]).reshape([bins, hidden]);

        let mixed = spectral_mix(input.clone(), gain_re, gain_im);
        let mixed = self.dropout.forward(mixed, rng);
        self.layer_norm.forward(mixed + input)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::SeedableRng;

    type TestBackend = NdArray<f32>;

    fn ramp(batch: usize, len: usize, hidden: usize) -> Tensor<TestBackend, 3> {
        let data: Vec<f32> = (0..batch * len * hidden)
            .map(|i| ((i * 7) % 11) as f32 * 0.3 - 1.2)
            .collect();
        Tensor::<TestBackend, 1>::from_floats(data.as_slice(), &Default::default())
            .reshape([batch, len, hidden])
    }

    fn assert_close(a: &[f32], b: &[f32], tol: f32) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() < tol, "index {i}: {x} vs {y}");
        }
    }

    #[test]
    fn test_unit_gain_is_identity() {
        let device = Default::default();
        // odd and even lengths take different Nyquist paths
        for len in [5usize, 6] {
            let bins  = frequency_bins(len);
            let input = ramp(2, len, 3);
            let out = spectral_mix(
                input.clone(),
                Tensor::<TestBackend, 2>::ones([bins, 3], &device),
                Tensor::<TestBackend, 2>::zeros([bins, 3], &device),
            );
            let out: Vec<f32>   = out.into_data().to_vec().unwrap();
            let input: Vec<f32> = input.into_data().to_vec().unwrap();
            assert_close(&out, &input, 1e-4);
        }
    }

    #[test]
    fn test_dc_only_gain_gives_positional_mean() {
        let device = Default::default();
        let (len, hidden) = (4usize, 2usize);
        let bins = frequency_bins(len);

        let mut dc = vec![0.0f32; bins * hidden];
        dc[0] = 1.0;
        dc[1] = 1.0;
        let gain_re = Tensor::<TestBackend, 1>::from_floats(dc.as_slice(), &device).reshape([bins, hidden]);

        let input = ramp(1, len, hidden);
        let expected = input.clone().mean_dim(1).repeat_dim(1, len);
        let out = spectral_mix(input, gain_re, Tensor::zeros([bins, hidden], &device));

        let out: Vec<f32>      = out.into_data().to_vec().unwrap();
        let expected: Vec<f32> = expected.into_data().to_vec().unwrap();
        assert_close(&out, &expected, 1e-4);
    }

    #[test]
    fn test_filter_block_shape() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(5);
        let filter = GlobalFilter::<TestBackend>::new(8, 4, 0.5, &mut rng, &device).unwrap();
        assert_eq!(filter.frequency_count(), 5);
        assert_eq!(filter.complex_weight.val().dims(), [5, 4, 2]);

        let out = filter.forward(ramp(3, 8, 4), None);
        assert_eq!(out.dims(), [3, 8, 4]);
    }
}
