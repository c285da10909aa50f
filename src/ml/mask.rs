// ============================================================
// Layer 5 — Causal Mask Builder
// ============================================================
// Turns a batch of padded item sequences into the additive
// bias the self-attention scores receive.
//
//   key j is visible from query i  ⇔  j ≤ i  and  (item_j > 0  or  j = i)
//
//   visible → 0
//   hidden  → MASK_BIAS (-1e4, large enough that exp() underflows to 0)
//
// The diagonal stays visible even on padding positions, so no row
// is ever fully masked. A fully masked row would softmax to a flat
// distribution over every key, future ones included.
//
// Output shape: [batch, 1, len, len], broadcast over heads.

use burn::prelude::*;

pub const MASK_BIAS: f32 = -10_000.0;

/// Row-major [len, len] matrix with 1 on and below the diagonal.
pub fn causal_allow_matrix(len: usize) -> Vec<f32> {
    (0..len)
        .flat_map(|i| (0..len).map(move |j| if j <= i { 1.0 } else { 0.0 }))
        .collect()
}

fn identity_matrix(len: usize) -> Vec<f32> {
    (0..len)
        .flat_map(|i| (0..len).map(move |j| if j == i { 1.0 } else { 0.0 }))
        .collect()
}

/// item_seq [batch, len] → additive attention bias [batch, 1, len, len]
pub fn attention_bias<B: Backend>(item_seq: Tensor<B, 2, Int>) -> Tensor<B, 4> {
    let [batch, len] = item_seq.dims();
    let device = item_seq.device();

    // 1 where the key position holds a real item
    let key_visible = item_seq.greater_elem(0).float().reshape([batch, 1, 1, len]);

    let causal = Tensor::<B, 1>::from_floats(causal_allow_matrix(len).as_slice(), &device)
        .reshape([1, 1, len, len]);
    let diagonal = Tensor::<B, 1>::from_floats(identity_matrix(len).as_slice(), &device)
        .reshape([1, 1, len, len]);

    // (visible ∨ diagonal) ∧ causal; the diagonal is already causal
    let visible = key_visible * causal;
    let allowed = visible.clone() + diagonal.clone() - visible * diagonal;

    allowed.neg().add_scalar(1.0).mul_scalar(MASK_BIAS)
}
