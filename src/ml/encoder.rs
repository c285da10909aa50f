// ============================================================
// Layer 5 — Sequence Encoder Stack
// ============================================================
// L identical-shape blocks, each:
//
//   hidden → token mixer (filter | attention) → feed-forward
//
// Both sublayers carry their own residual + LayerNorm + dropout.
// The mixer variant is fixed when the stack is built; forward
// simply dispatches on it.

use burn::prelude::*;
use rand::rngs::StdRng;

use crate::ml::{
    attention::SelfAttention,
    config::{FmlpConfig, TokenMixerKind},
    error::ModelResult,
    feed_forward::FeedForward,
    filter::GlobalFilter,
};

#[derive(Module, Debug)]
pub enum TokenMixer<B: Backend> {
    Filter(GlobalFilter<B>),
    Attention(SelfAttention<B>),
}

impl<B: Backend> TokenMixer<B> {
    pub fn new(cfg: &FmlpConfig, rng: &mut StdRng, device: &B::Device) -> ModelResult<Self> {
        Ok(match cfg.token_mixer {
            TokenMixerKind::Filter => TokenMixer::Filter(GlobalFilter::new(
                cfg.max_seq_length,
                cfg.hidden_size,
                cfg.hidden_dropout_prob,
                rng,
                device,
            )?),
            TokenMixerKind::Attention => TokenMixer::Attention(SelfAttention::new(
                cfg.hidden_size,
                cfg.num_attention_heads,
                cfg.attention_probs_dropout_prob,
                cfg.hidden_dropout_prob,
                cfg.initializer_range,
                rng,
                device,
            )?),
        })
    }

    /// The attention bias is only read by the attention variant;
    /// the filter variant is built without one.
    pub fn forward(
        &self,
        hidden: Tensor<B, 3>,
        bias:   Option<Tensor<B, 4>>,
        rng:    Option<&mut StdRng>,
    ) -> Tensor<B, 3> {
        match self {
            TokenMixer::Filter(filter)  => filter.forward(hidden, rng),
            TokenMixer::Attention(attn) => attn.forward(hidden, bias, rng),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub mixer:        TokenMixer<B>,
    pub feed_forward: FeedForward<B>,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn new(cfg: &FmlpConfig, rng: &mut StdRng, device: &B::Device) -> ModelResult<Self> {
        let mixer = TokenMixer::new(cfg, rng, device)?;
        let feed_forward = FeedForward::new(
            cfg.hidden_size,
            cfg.intermediate_size(),
            cfg.hidden_act,
            cfg.hidden_dropout_prob,
            cfg.initializer_range,
            rng,
            device,
        )?;
        Ok(Self { mixer, feed_forward })
    }

    pub fn forward(
        &self,
        hidden: Tensor<B, 3>,
        bias:   Option<Tensor<B, 4>>,
        rng:    Option<&mut StdRng>,
    ) -> Tensor<B, 3> {
        let mut rng = rng;
        let mixed = self.mixer.forward(hidden, bias, rng.as_deref_mut());
        self.feed_forward.forward(mixed, rng)
    }
}

#[derive(Module, Debug)]
pub struct EncoderStack<B: Backend> {
    pub blocks: Vec<EncoderBlock<B>>,
}

impl<B: Backend> EncoderStack<B> {
    pub fn new(cfg: &FmlpConfig, rng: &mut StdRng, device: &B::Device) -> ModelResult<Self> {
        let blocks = (0..cfg.num_hidden_layers)
            .map(|_| EncoderBlock::new(cfg, rng, device))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Self { blocks })
    }

    /// Returns every block's output in order; the last one is the encoding.
    pub fn forward(
        &self,
        hidden: Tensor<B, 3>,
        bias:   Option<Tensor<B, 4>>,
        rng:    Option<&mut StdRng>,
    ) -> Vec<Tensor<B, 3>> {
        let mut rng = rng;
        let mut hidden = hidden;
        let mut layers = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            hidden = block.forward(hidden, bias.clone(), rng.as_deref_mut());
            layers.push(hidden.clone());
        }
        layers
    }
}
