// ============================================================
// Layer 5 — Seeded Parameters
// ============================================================
// Affine maps and lookup tables whose weights are drawn from a
// caller-supplied StdRng instead of the backend's global seed,
// so two models built from the same seed are identical on any
// backend.
//
// Initialisation rule for every weight built here:
//   weight ~ Normal(0, std), bias = 0

use burn::{module::Param, prelude::*};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::ml::error::{ModelError, ModelResult};

/// Draw a tensor of the given shape from Normal(0, std).
pub fn normal_tensor<B: Backend, const D: usize>(
    shape:  [usize; D],
    std:    f64,
    rng:    &mut StdRng,
    device: &B::Device,
) -> ModelResult<Tensor<B, D>> {
    let normal = Normal::new(0.0f32, std as f32)
        .map_err(|e| ModelError::InvalidConfig(format!("normal initialiser std={std}: {e}")))?;
    let count: usize = shape.iter().product();
    let data: Vec<f32> = (0..count).map(|_| normal.sample(rng)).collect();
    Ok(Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape(shape))
}

// ─── Dense ────────────────────────────────────────────────────────────────────
/// Affine map applied over the last dimension.
#[derive(Module, Debug)]
pub struct Dense<B: Backend> {
    /// Shape [d_input, d_output]
    pub weight: Param<Tensor<B, 2>>,
    /// Shape [d_output]
    pub bias:   Param<Tensor<B, 1>>,
}

impl<B: Backend> Dense<B> {
    pub fn new(
        d_input:  usize,
        d_output: usize,
        std:      f64,
        rng:      &mut StdRng,
        device:   &B::Device,
    ) -> ModelResult<Self> {
        let weight = normal_tensor([d_input, d_output], std, rng, device)?;
        let bias   = Tensor::zeros([d_output], device);
        Ok(Self {
            weight: Param::from_tensor(weight),
            bias:   Param::from_tensor(bias),
        })
    }

    /// [..., d_input] → [..., d_output]
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        input.matmul(self.weight.val().unsqueeze()) + self.bias.val().unsqueeze()
    }
}

// ─── EmbeddingTable ───────────────────────────────────────────────────────────
/// Dense lookup table indexed by integer ids.
#[derive(Module, Debug)]
pub struct EmbeddingTable<B: Backend> {
    /// Shape [num_rows, dim]
    pub weight: Param<Tensor<B, 2>>,
}

impl<B: Backend> EmbeddingTable<B> {
    pub fn new(
        num_rows: usize,
        dim:      usize,
        std:      f64,
        rng:      &mut StdRng,
        device:   &B::Device,
    ) -> ModelResult<Self> {
        let weight = normal_tensor([num_rows, dim], std, rng, device)?;
        Ok(Self { weight: Param::from_tensor(weight) })
    }

    pub fn num_rows(&self) -> usize {
        self.weight.val().dims()[0]
    }

    pub fn dim(&self) -> usize {
        self.weight.val().dims()[1]
    }

    /// The full table with row 0 cut from the autodiff graph.
    /// Row 0 is the padding item: it keeps its initial value but never
    /// receives a gradient, so the optimiser leaves it untouched.
    ///
    ///   table = W ⊙ m + detach(W) ⊙ (1 − m),   m = [0, 1, 1, …]ᵀ
    ///
    /// Every other row keeps its own gradient, unscaled.
    pub fn weight_frozen_padding(&self) -> Tensor<B, 2> {
        let weight = self.weight.val();
        let [rows, _] = weight.dims();

        let mut keep = vec![1.0f32; rows];
        if let Some(padding) = keep.first_mut() {
            *padding = 0.0;
        }
        let mask = Tensor::<B, 1>::from_floats(keep.as_slice(), &weight.device()).reshape([rows, 1]);
        let frozen = mask.clone().mul_scalar(-1.0).add_scalar(1.0);

        weight.clone() * mask + weight.detach() * frozen
    }

    /// ids [batch, len] → [batch, len, dim], rows taken from `table`.
    pub fn lookup_in(table: Tensor<B, 2>, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch, len] = ids.dims();
        let [_, dim]     = table.dims();
        table
            .select(0, ids.reshape([batch * len]))
            .reshape([batch, len, dim])
    }

    /// ids [batch, len] → [batch, len, dim]
    pub fn lookup(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        Self::lookup_in(self.weight.val(), ids)
    }
}
