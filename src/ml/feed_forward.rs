// ============================================================
// Layer 5 — Position-wise Feed-Forward
// ============================================================
//   out = LayerNorm(dropout(W2 · act(W1 · x)) + x)
// W1: hidden → 4·hidden, W2: 4·hidden → hidden.

use burn::{
    module::Ignored,
    nn::{LayerNorm, LayerNormConfig},
    prelude::*,
    tensor::activation,
};
use rand::rngs::StdRng;

use crate::ml::{config::Activation, dropout::SeededDropout, error::ModelResult, params::Dense};

#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub dense_1:    Dense<B>,
    pub dense_2:    Dense<B>,
    pub activation: Ignored<Activation>,
    pub dropout:    SeededDropout,
    pub layer_norm: LayerNorm<B>,
}

impl<B: Backend> FeedForward<B> {
    pub fn new(
        hidden_size:       usize,
        intermediate_size: usize,
        act:               Activation,
        dropout_prob:      f64,
        init_std:          f64,
        rng:               &mut StdRng,
        device:            &B::Device,
    ) -> ModelResult<Self> {
        Ok(Self {
            dense_1:    Dense::new(hidden_size, intermediate_size, init_std, rng, device)?,
            dense_2:    Dense::new(intermediate_size, hidden_size, init_std, rng, device)?,
            activation: Ignored(act),
            dropout:    SeededDropout::new(dropout_prob),
            layer_norm: LayerNormConfig::new(hidden_size).with_epsilon(1e-12).init(device),
        })
    }

    pub fn forward(&self, input: Tensor<B, 3>, rng: Option<&mut StdRng>) -> Tensor<B, 3> {
        let hidden = self.dense_1.forward(input.clone());
        let hidden = match *self.activation {
            Activation::Gelu => activation::gelu(hidden),
            Activation::Relu => activation::relu(hidden),
        };
        let hidden = self.dense_2.forward(hidden);
        let hidden = self.dropout.forward(hidden, rng);
        self.layer_norm.forward(hidden + input)
    }
}
