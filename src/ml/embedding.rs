// ============================================================
// Layer 5 — Embedding Composer
// ============================================================
// item ids [batch, len] → dropout(LayerNorm(item_emb + pos_emb))
//
// Padding (id 0) still gets its row plus a position vector here;
// keeping padding from influencing real positions is the mask's
// job, not this component's. Row 0 of the item table is detached
// so it never receives a gradient.

use burn::{
    nn::{LayerNorm, LayerNormConfig},
    prelude::*,
};
use rand::rngs::StdRng;

use crate::ml::{
    config::FmlpConfig,
    dropout::SeededDropout,
    error::ModelResult,
    params::EmbeddingTable,
};

#[derive(Module, Debug)]
pub struct EmbeddingComposer<B: Backend> {
    pub item_embeddings:     EmbeddingTable<B>,
    pub position_embeddings: EmbeddingTable<B>,
    pub layer_norm:          LayerNorm<B>,
    pub dropout:             SeededDropout,
}

impl<B: Backend> EmbeddingComposer<B> {
    pub fn new(cfg: &FmlpConfig, rng: &mut StdRng, device: &B::Device) -> ModelResult<Self> {
        let std = cfg.initializer_range;
        Ok(Self {
            item_embeddings:     EmbeddingTable::new(cfg.item_size, cfg.hidden_size, std, rng, device)?,
            position_embeddings: EmbeddingTable::new(cfg.max_seq_length, cfg.hidden_size, std, rng, device)?,
            layer_norm:          LayerNormConfig::new(cfg.hidden_size).with_epsilon(1e-12).init(device),
            dropout:             SeededDropout::new(cfg.hidden_dropout_prob),
        })
    }

    /// Item table as seen by the forward pass (padding row frozen).
    pub fn item_weight(&self) -> Tensor<B, 2> {
        self.item_embeddings.weight_frozen_padding()
    }

    /// item_seq [batch, len] → [batch, len, hidden]. `len` ≤ max_seq_length
    /// is checked by the model before this is called.
    pub fn forward(&self, item_seq: Tensor<B, 2, Int>, rng: Option<&mut StdRng>) -> Tensor<B, 3> {
        let [_, len] = item_seq.dims();
        let hidden = self.position_embeddings.dim();

        let items = EmbeddingTable::lookup_in(self.item_weight(), item_seq);
        let positions = self
            .position_embeddings
            .weight
            .val()
            .slice([0..len, 0..hidden])
            .unsqueeze::<3>(); // [1, len, hidden], broadcast over the batch

        let composed = self.layer_norm.forward(items + positions);
        self.dropout.forward(composed, rng)
    }
}
