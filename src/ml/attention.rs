// ============================================================
// Layer 5 — Multi-Head Self-Attention
// ============================================================
// The alternative token mixer, used when filters are disabled.
//
//   scores = Q·Kᵀ / √head_size + bias        bias from mask.rs
//   probs  = dropout(softmax(scores))
//   out    = LayerNorm(dropout(dense(probs·V)) + input)
//
// Tensor layout through the heads: [batch, heads, len, head_size].

use burn::{
    nn::{LayerNorm, LayerNormConfig},
    prelude::*,
    tensor::activation,
};
use rand::rngs::StdRng;

use crate::ml::{dropout::SeededDropout, error::ModelResult, params::Dense};

#[derive(Module, Debug)]
pub struct SelfAttention<B: Backend> {
    pub query:        Dense<B>,
    pub key:          Dense<B>,
    pub value:        Dense<B>,
    pub dense:        Dense<B>,
    pub attn_dropout: SeededDropout,
    pub out_dropout:  SeededDropout,
    pub layer_norm:   LayerNorm<B>,
    pub num_heads:    usize,
}

impl<B: Backend> SelfAttention<B> {
    /// `hidden_size % num_heads == 0` is checked by `FmlpConfig::validate`.
    pub fn new(
        hidden_size:       usize,
        num_heads:         usize,
        attn_dropout_prob: f64,
        hidden_dropout:    f64,
        init_std:          f64,
        rng:               &mut StdRng,
        device:            &B::Device,
    ) -> ModelResult<Self> {
        Ok(Self {
            query:        Dense::new(hidden_size, hidden_size, init_std, rng, device)?,
            key:          Dense::new(hidden_size, hidden_size, init_std, rng, device)?,
            value:        Dense::new(hidden_size, hidden_size, init_std, rng, device)?,
            dense:        Dense::new(hidden_size, hidden_size, init_std, rng, device)?,
            attn_dropout: SeededDropout::new(attn_dropout_prob),
            out_dropout:  SeededDropout::new(hidden_dropout),
            layer_norm:   LayerNormConfig::new(hidden_size).with_epsilon(1e-12).init(device),
            num_heads,
        })
    }

    /// [batch, len, hidden] → [batch, heads, len, head_size]
    fn split_heads(&self, x: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch, len, hidden] = x.dims();
        x.reshape([batch, len, self.num_heads, hidden / self.num_heads])
            .swap_dims(1, 2)
    }

    /// input [batch, len, hidden], bias [batch, 1, len, len] → [batch, len, hidden]
    /// Without a bias every position attends to every other.
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        bias:  Option<Tensor<B, 4>>,
        rng:   Option<&mut StdRng>,
    ) -> Tensor<B, 3> {
        let mut rng = rng;
        let [batch, len, hidden] = input.dims();
        let head_size = hidden / self.num_heads;

        let q = self.split_heads(self.query.forward(input.clone()));
        let k = self.split_heads(self.key.forward(input.clone()));
        let v = self.split_heads(self.value.forward(input.clone()));

        let scores = q.matmul(k.swap_dims(2, 3)).div_scalar((head_size as f64).sqrt());
        let scores = match bias {
            Some(bias) => scores + bias,
            None       => scores,
        };
        let probs  = activation::softmax(scores, 3);
        let probs  = self.attn_dropout.forward(probs, rng.as_deref_mut());

        let context = probs
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch, len, hidden]);

        let hidden_states = self.dense.forward(context);
        let hidden_states = self.out_dropout.forward(hidden_states, rng);
        self.layer_norm.forward(hidden_states + input)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::mask::attention_bias;
    use burn::backend::NdArray;
    use rand::SeedableRng;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(2);
        let attn = SelfAttention::<TestBackend>::new(8, 2, 0.5, 0.5, 0.02, &mut rng, &device).unwrap();

        let seq   = Tensor::<TestBackend, 1, Int>::from_ints([0, 0, 4, 7, 1, 2, 3, 4], &device).reshape([2, 4]);
        let input = Tensor::<TestBackend, 3>::ones([2, 4, 8], &device);
        let out   = attn.forward(input, Some(attention_bias(seq)), Some(&mut rng));
        assert_eq!(out.dims(), [2, 4, 8]);
    }

    #[test]
    fn test_future_keys_do_not_leak() {
        let device = Default::default();
        let attn = SelfAttention::<TestBackend>::new(4, 1, 0.0, 0.0, 0.5, &mut StdRng::seed_from_u64(4), &device).unwrap();
        let seq  = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3], &device).reshape([1, 3]);

        let base: Vec<f32> = (0..12).map(|i| i as f32 * 0.1).collect();
        // change only the last position
        let mut perturbed = base.clone();
        perturbed[8]  += 3.0;
        perturbed[10] -= 2.0;

        let run = |data: &[f32]| -> Vec<f32> {
            let input = Tensor::<TestBackend, 1>::from_floats(data, &device).reshape([1, 3, 4]);
            attn.forward(input, Some(attention_bias(seq.clone())), None).into_data().to_vec().unwrap()
        };
        let a = run(&base);
        let b = run(&perturbed);
        for i in 0..8 {
            assert!((a[i] - b[i]).abs() < 1e-6, "position {} changed", i / 4);
        }
        assert!((8..12).any(|i| (a[i] - b[i]).abs() > 1e-3));
    }
}
