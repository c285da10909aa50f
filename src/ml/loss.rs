// ============================================================
// Layer 5 — Pairwise Logistic Loss
// ============================================================
// One loss for every caller that trains the model:
//
//   l(t) = -log(σ(pos_t) + ε) - log(1 - σ(neg_t) + ε)
//   loss = Σ w_t · l(t) / Σ w_t        (w ≡ 1 unless weights given)
//
// pos_t / neg_t are the dot products of the encoded position t
// with the true next item and a sampled negative item.

use burn::{prelude::*, tensor::activation};

/// Keeps log() finite when a sigmoid saturates.
pub const LOG_EPSILON: f64 = 1e-24;

/// Shift the input sequence left by one and append the true next item.
///
/// item_seq [batch, len], next_items [batch] → [batch, len]
pub fn next_item_targets<B: Backend>(
    item_seq:   Tensor<B, 2, Int>,
    next_items: Tensor<B, 1, Int>,
) -> Tensor<B, 2, Int> {
    let [batch, len] = item_seq.dims();
    let last = next_items.reshape([batch, 1]);
    if len == 1 {
        return last;
    }
    Tensor::cat(vec![item_seq.slice([0..batch, 1..len]), last], 1)
}

/// 1 where the target is a real item, 0 on padding.
pub fn target_weights<B: Backend>(targets: Tensor<B, 2, Int>) -> Tensor<B, 2> {
    targets.greater_elem(0).float()
}

/// pos_logits, neg_logits [batch, len] → scalar loss [1]
///
/// With `weights` the mean runs over the weighted positions only. An
/// all-zero weight tensor yields 0 rather than NaN.
pub fn pairwise_logistic_loss<B: Backend>(
    pos_logits: Tensor<B, 2>,
    neg_logits: Tensor<B, 2>,
    weights:    Option<Tensor<B, 2>>,
) -> Tensor<B, 1> {
    let pos_term = activation::sigmoid(pos_logits)
        .add_scalar(LOG_EPSILON)
        .log()
        .neg();
    // 1 - σ first, then ε: the other order loses ε to f32 rounding
    let neg_term = activation::sigmoid(neg_logits)
        .neg()
        .add_scalar(1.0)
        .add_scalar(LOG_EPSILON)
        .log()
        .neg();
    let per_position = pos_term + neg_term;

    match weights {
        None => per_position.mean(),
        Some(weights) => {
            let total = weights.clone().sum().clamp_min(1.0);
            (per_position * weights).sum() / total
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn logits(values: &[f32], batch: usize) -> Tensor<TestBackend, 2> {
        Tensor::<TestBackend, 1>::from_floats(values, &Default::default())
            .reshape([batch, values.len() / batch])
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_data().to_vec::<f32>().unwrap()[0]
    }

    #[test]
    fn test_targets_shift_and_append() {
        let device = Default::default();
        let seq  = Tensor::<TestBackend, 1, Int>::from_ints([0, 5, 9, 14, 1, 2, 3, 4], &device).reshape([2, 4]);
        let next = Tensor::<TestBackend, 1, Int>::from_ints([21, 5], &device);
        let targets: Vec<i64> = next_item_targets(seq, next).into_data().to_vec().unwrap();
        assert_eq!(targets, vec![5, 9, 14, 21, 2, 3, 4, 5]);
    }

    #[test]
    fn test_zero_logits_give_two_log_two() {
        let loss = scalar(pairwise_logistic_loss(logits(&[0.0; 6], 2), logits(&[0.0; 6], 2), None));
        assert!((loss - 2.0 * std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_positive_finite_and_grows_with_negative_similarity() {
        let pos = [2.0, 0.5, -1.0, 3.0];
        let mut previous = 0.0f32;
        for neg in [-4.0f32, -1.0, 0.0, 1.5, 6.0] {
            let loss = scalar(pairwise_logistic_loss(logits(&pos, 1), logits(&[neg; 4], 1), None));
            assert!(loss.is_finite() && loss > 0.0);
            assert!(loss > previous, "loss {loss} did not grow at neg={neg}");
            previous = loss;
        }
    }

    #[test]
    fn test_saturated_logits_stay_finite() {
        let loss = scalar(pairwise_logistic_loss(logits(&[-200.0, 200.0], 1), logits(&[200.0, -200.0], 1), None));
        assert!(loss.is_finite());
        assert!(loss > 10.0);
    }

    #[test]
    fn test_weights_drop_padded_positions() {
        let device = Default::default();
        let pos = logits(&[9.0, 0.0], 1);
        let neg = logits(&[-9.0, 0.0], 1);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 7], &device).reshape([1, 2]);

        // only the second position (log 2 + log 2) counts
        let masked = scalar(pairwise_logistic_loss(pos.clone(), neg.clone(), Some(target_weights(targets))));
        assert!((masked - 2.0 * std::f32::consts::LN_2).abs() < 1e-5);

        let unmasked = scalar(pairwise_logistic_loss(pos, neg, None));
        assert!(unmasked < masked);
    }
}
