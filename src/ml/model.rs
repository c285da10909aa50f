// ============================================================
// Layer 5 — FMLP Sequential Recommender
// ============================================================
// Full model:
//
//   item_seq ──► EmbeddingComposer ──► EncoderStack ──► last block
//                                          ▲
//                 attention_bias(item_seq) ┘  (attention mode only)
//
// Scores are dot products between the encoded vector at the
// final position and rows of the (shared) item embedding table.
// Sequences are left-padded, so the final position always holds
// the most recent interaction.

use burn::{module::Ignored, prelude::*};
use rand::rngs::StdRng;

use crate::ml::{
    config::{FmlpConfig, TokenMixerKind},
    embedding::EmbeddingComposer,
    encoder::EncoderStack,
    error::{ModelError, ModelResult},
    loss::{next_item_targets, pairwise_logistic_loss, target_weights},
    mask::attention_bias,
    params::EmbeddingTable,
    recommender::SequentialRecommender,
};

impl FmlpConfig {
    /// Validate, then build every parameter from `rng`.
    /// Two calls with equally seeded generators give identical models.
    pub fn init<B: Backend>(&self, device: &B::Device, rng: &mut StdRng) -> ModelResult<FmlpRec<B>> {
        self.validate()?;

        let embeddings = EmbeddingComposer::new(self, rng, device)?;
        let encoder    = EncoderStack::new(self, rng, device)?;
        let model = FmlpRec { embeddings, encoder, config: Ignored(self.clone()) };

        tracing::info!(
            "FMLP model ready: {:?} mixer, {} blocks, hidden={}, items={}, params={}",
            self.token_mixer,
            self.num_hidden_layers,
            self.hidden_size,
            self.item_size,
            model.num_params(),
        );
        Ok(model)
    }
}

#[derive(Module, Debug)]
pub struct FmlpRec<B: Backend> {
    pub embeddings: EmbeddingComposer<B>,
    pub encoder:    EncoderStack<B>,
    pub config:     Ignored<FmlpConfig>,
}

impl<B: Backend> FmlpRec<B> {
    pub fn config(&self) -> &FmlpConfig {
        &self.config
    }

    pub fn item_size(&self) -> usize {
        self.config.item_size
    }

    // ─── Shape checks ─────────────────────────────────────────────────────────

    fn check_sequence(&self, item_seq: &Tensor<B, 2, Int>) -> ModelResult<()> {
        let [batch, len] = item_seq.dims();
        let max = self.config.max_seq_length;
        if batch == 0 || len == 0 {
            return Err(ModelError::ShapeMismatch {
                argument: "item_seq",
                expected: vec![batch.max(1), max],
                actual:   vec![batch, len],
            });
        }
        if len > max {
            return Err(ModelError::SequenceTooLong { len, max });
        }
        if self.config.token_mixer == TokenMixerKind::Filter && len != max {
            return Err(ModelError::FilterLengthMismatch { len, expected: max });
        }
        self.check_item_range(item_seq.clone())
    }

    fn check_batch(argument: &'static str, expected: usize, actual: usize) -> ModelResult<()> {
        if actual != expected {
            return Err(ModelError::BatchMismatch { argument, expected, actual });
        }
        Ok(())
    }

    /// Every id must index a row of the item table.
    fn check_item_range<const D: usize>(&self, ids: Tensor<B, D, Int>) -> ModelResult<()> {
        if ids.shape().num_elements() == 0 {
            return Ok(());
        }
        let item_size = self.config.item_size;
        let min = ids.clone().min().into_scalar().elem::<i64>();
        let max = ids.max().into_scalar().elem::<i64>();
        for item in [min, max] {
            if item < 0 || item as usize >= item_size {
                return Err(ModelError::ItemOutOfRange { item, item_size });
            }
        }
        Ok(())
    }

    // ─── Forward ──────────────────────────────────────────────────────────────

    /// Output of every encoder block, first to last.
    pub fn forward_layers(
        &self,
        item_seq: Tensor<B, 2, Int>,
        rng:      Option<&mut StdRng>,
    ) -> ModelResult<Vec<Tensor<B, 3>>> {
        self.check_sequence(&item_seq)?;
        let mut rng = rng;

        let bias = match self.config.token_mixer {
            TokenMixerKind::Attention => Some(attention_bias(item_seq.clone())),
            TokenMixerKind::Filter    => None,
        };
        let hidden = self.embeddings.forward(item_seq, rng.as_deref_mut());
        Ok(self.encoder.forward(hidden, bias, rng))
    }

    /// Encoded vector of the final position: [batch, hidden]
    fn final_state(
        &self,
        item_seq:     Tensor<B, 2, Int>,
        item_seq_len: Tensor<B, 1, Int>,
    ) -> ModelResult<Tensor<B, 2>> {
        let encoded = self.encode(item_seq, item_seq_len, None)?;
        let [batch, len, hidden] = encoded.dims();
        Ok(encoded.slice([0..batch, len - 1..len, 0..hidden]).reshape([batch, hidden]))
    }
}

impl<B: Backend> SequentialRecommender<B> for FmlpRec<B> {
    fn encode(
        &self,
        item_seq:     Tensor<B, 2, Int>,
        item_seq_len: Tensor<B, 1, Int>,
        rng:          Option<&mut StdRng>,
    ) -> ModelResult<Tensor<B, 3>> {
        let [batch, _] = item_seq.dims();
        Self::check_batch("item_seq_len", batch, item_seq_len.dims()[0])?;

        self.forward_layers(item_seq, rng)?
            .pop()
            .ok_or_else(|| ModelError::InvalidConfig("encoder has no blocks".into()))
    }

    fn compute_loss(
        &self,
        item_seq:   Tensor<B, 2, Int>,
        next_items: Tensor<B, 1, Int>,
        negatives:  Tensor<B, 2, Int>,
        rng:        &mut StdRng,
    ) -> ModelResult<Tensor<B, 1>> {
        let [batch, len] = item_seq.dims();
        Self::check_batch("next_items", batch, next_items.dims()[0])?;
        if negatives.dims() != [batch, len] {
            return Err(ModelError::ShapeMismatch {
                argument: "negatives",
                expected: vec![batch, len],
                actual:   negatives.dims().to_vec(),
            });
        }
        self.check_item_range(next_items.clone())?;
        self.check_item_range(negatives.clone())?;

        let device = item_seq.device();
        let lengths = Tensor::<B, 1, Int>::full([batch], len as i64, &device);
        let encoded = self.encode(item_seq.clone(), lengths, Some(rng))?;

        let targets = next_item_targets(item_seq, next_items);
        let weights = self.config.mask_padded_targets.then(|| target_weights(targets.clone()));

        let table   = self.embeddings.item_weight();
        let pos_emb = EmbeddingTable::lookup_in(table.clone(), targets);
        let neg_emb = EmbeddingTable::lookup_in(table, negatives);

        let pos_logits = (encoded.clone() * pos_emb).sum_dim(2).reshape([batch, len]);
        let neg_logits = (encoded * neg_emb).sum_dim(2).reshape([batch, len]);

        Ok(pairwise_logistic_loss(pos_logits, neg_logits, weights))
    }

    fn score_one(
        &self,
        item_seq:     Tensor<B, 2, Int>,
        item_seq_len: Tensor<B, 1, Int>,
        candidates:   Tensor<B, 1, Int>,
    ) -> ModelResult<Tensor<B, 1>> {
        let [batch, _] = item_seq.dims();
        Self::check_batch("candidates", batch, candidates.dims()[0])?;
        self.check_item_range(candidates.clone())?;

        let state = self.final_state(item_seq, item_seq_len)?;
        let candidate_emb = self.embeddings.item_weight().select(0, candidates);

        Ok((state * candidate_emb).sum_dim(1).reshape([batch]))
    }

    fn score_all(
        &self,
        item_seq:     Tensor<B, 2, Int>,
        item_seq_len: Tensor<B, 1, Int>,
    ) -> ModelResult<Tensor<B, 2>> {
        let state = self.final_state(item_seq, item_seq_len)?;
        Ok(state.matmul(self.embeddings.item_weight().transpose()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::config::LossType;
    use burn::backend::NdArray;
    use rand::SeedableRng;

    type TestBackend = NdArray<f32>;

    fn seq(items: &[i64], batch: usize) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(items, &Default::default())
            .reshape([batch, items.len() / batch])
    }

    fn lens(values: &[i64]) -> Tensor<TestBackend, 1, Int> {
        Tensor::from_ints(values, &Default::default())
    }

    fn build(cfg: &FmlpConfig, seed: u64) -> FmlpRec<TestBackend> {
        cfg.init(&Default::default(), &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    fn small(kind: TokenMixerKind) -> FmlpConfig {
        FmlpConfig::new(12)
            .with_hidden_size(8)
            .with_num_hidden_layers(2)
            .with_max_seq_length(5)
            .with_token_mixer(kind)
    }

    fn floats<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    #[test]
    fn test_reference_scenario_shapes_and_stable_argmax() {
        let cfg = FmlpConfig::new(12102);
        let model = build(&cfg, 3232);

        let mut items = vec![0i64; 47];
        items.extend([5, 9, 14]);
        let item_seq = seq(&items, 1);

        let encoded = model.encode(item_seq.clone(), lens(&[3]), None).unwrap();
        assert_eq!(encoded.dims(), [1, 50, 64]);

        let scores = model.score_all(item_seq.clone(), lens(&[3])).unwrap();
        assert_eq!(scores.dims(), [1, 12102]);

        let first: Vec<i64>  = scores.argmax(1).into_data().to_vec().unwrap();
        let second: Vec<i64> = model.score_all(item_seq, lens(&[3])).unwrap().argmax(1).into_data().to_vec().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_inference_is_bit_identical() {
        for kind in [TokenMixerKind::Filter, TokenMixerKind::Attention] {
            let model = build(&small(kind), 1);
            let a = floats(model.encode(seq(&[0, 0, 3, 4, 7], 1), lens(&[3]), None).unwrap());
            let b = floats(model.encode(seq(&[0, 0, 3, 4, 7], 1), lens(&[3]), None).unwrap());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_same_seed_same_model() {
        let cfg = small(TokenMixerKind::Filter);
        let a = floats(build(&cfg, 9).score_all(seq(&[0, 1, 2, 3, 4], 1), lens(&[4])).unwrap());
        let b = floats(build(&cfg, 9).score_all(seq(&[0, 1, 2, 3, 4], 1), lens(&[4])).unwrap());
        let c = floats(build(&cfg, 10).score_all(seq(&[0, 1, 2, 3, 4], 1), lens(&[4])).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_dropout_changes_training_encodings() {
        let model = build(&small(TokenMixerKind::Filter), 1);
        let item_seq = seq(&[0, 0, 3, 4, 7], 1);
        let eval  = floats(model.encode(item_seq.clone(), lens(&[3]), None).unwrap());
        let train = floats(model.encode(item_seq, lens(&[3]), Some(&mut StdRng::seed_from_u64(0))).unwrap());
        assert_ne!(eval, train);
    }

    #[test]
    fn test_score_all_matches_score_one() {
        for kind in [TokenMixerKind::Filter, TokenMixerKind::Attention] {
            let model = build(&small(kind), 5);
            let item_seq = seq(&[0, 0, 3, 4, 7, 1, 2, 3, 4, 5], 2);
            let lengths  = lens(&[3, 5]);

            let all = floats(model.score_all(item_seq.clone(), lengths.clone()).unwrap());
            for k in 0..12i64 {
                let one = floats(model.score_one(item_seq.clone(), lengths.clone(), lens(&[k, k])).unwrap());
                for b in 0..2 {
                    let full = all[b * 12 + k as usize];
                    assert!((full - one[b]).abs() < 1e-5, "item {k}, row {b}: {full} vs {}", one[b]);
                }
            }
        }
    }

    #[test]
    fn test_future_items_do_not_change_earlier_positions() {
        let model = build(&small(TokenMixerKind::Attention), 2);
        let a = floats(model.encode(seq(&[3, 1, 4, 1, 5], 1), lens(&[5]), None).unwrap());
        let b = floats(model.encode(seq(&[3, 1, 4, 9, 0], 1), lens(&[4]), None).unwrap());

        // positions 0..=2 cover the first 3 * hidden values
        for i in 0..24 {
            assert!((a[i] - b[i]).abs() < 1e-6, "position {} changed", i / 8);
        }
        assert!((24..40).any(|i| (a[i] - b[i]).abs() > 1e-4));
    }

    #[test]
    fn test_all_padding_position_zero_is_an_isolated_token() {
        let model = build(&small(TokenMixerKind::Attention), 4);
        let full = floats(model.encode(seq(&[0, 0, 0, 0, 0], 1), lens(&[0]), None).unwrap());
        let alone = floats(model.encode(seq(&[0], 1), lens(&[0]), None).unwrap());

        assert_eq!(alone.len(), 8);
        for i in 0..8 {
            assert!((full[i] - alone[i]).abs() < 1e-5);
        }
        assert!(full.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_loss_is_positive_and_finite() {
        let mut rng = StdRng::seed_from_u64(0);
        for mask in [false, true] {
            let cfg = small(TokenMixerKind::Filter).with_mask_padded_targets(mask);
            let model = build(&cfg, 6);
            let loss = model
                .compute_loss(
                    seq(&[0, 0, 3, 4, 7, 1, 2, 3, 4, 5], 2),
                    lens(&[8, 6]),
                    seq(&[2, 9, 10, 11, 1, 7, 8, 9, 10, 11], 2),
                    &mut rng,
                )
                .unwrap();
            let loss = floats(loss)[0];
            assert!(loss.is_finite() && loss > 0.0);
        }
    }

    #[test]
    fn test_shape_errors() {
        let model = build(&FmlpConfig::new(20).with_max_seq_length(4).with_hidden_size(8), 0);

        assert_eq!(
            model.encode(seq(&[1, 2, 3, 4, 5], 1), lens(&[5]), None).err(),
            Some(ModelError::SequenceTooLong { len: 5, max: 4 })
        );
        assert_eq!(
            model.encode(seq(&[1, 2, 3], 1), lens(&[3]), None).err(),
            Some(ModelError::FilterLengthMismatch { len: 3, expected: 4 })
        );
        assert_eq!(
            model.score_all(seq(&[1, 2, 3, 4], 1), lens(&[4, 4])).err(),
            Some(ModelError::BatchMismatch { argument: "item_seq_len", expected: 1, actual: 2 })
        );
        assert_eq!(
            model.score_one(seq(&[1, 2, 3, 4], 1), lens(&[4]), lens(&[20])).err(),
            Some(ModelError::ItemOutOfRange { item: 20, item_size: 20 })
        );
        assert!(matches!(
            model.compute_loss(seq(&[1, 2, 3, 4], 1), lens(&[5]), seq(&[1, 2, 3], 1), &mut StdRng::seed_from_u64(0)),
            Err(ModelError::ShapeMismatch { argument: "negatives", .. })
        ));
    }

    #[test]
    fn test_empty_batch_is_reported() {
        let device = Default::default();
        let model = build(&small(TokenMixerKind::Attention), 0);
        let empty = Tensor::<TestBackend, 2, Int>::zeros([0, 5], &device);
        let lengths = Tensor::<TestBackend, 1, Int>::zeros([0], &device);

        assert!(matches!(
            model.encode(empty.clone(), lengths.clone(), None),
            Err(ModelError::ShapeMismatch { argument: "item_seq", .. })
        ));
        assert!(matches!(
            model.score_all(empty, lengths),
            Err(ModelError::ShapeMismatch { argument: "item_seq", .. })
        ));
    }

    #[test]
    fn test_adam_step_moves_only_the_rows_in_the_batch() {
        use burn::backend::Autodiff;
        use burn::optim::{AdamConfig, GradientsParams, Optimizer};

        type TestAutodiffBackend = Autodiff<TestBackend>;
        let device = Default::default();
        let cfg = small(TokenMixerKind::Filter)
            .with_hidden_dropout_prob(0.0)
            .with_attention_probs_dropout_prob(0.0);
        let mut rng = StdRng::seed_from_u64(8);
        let model: FmlpRec<TestAutodiffBackend> = cfg.init(&device, &mut rng).unwrap();

        let ints = |values: &[i64]| Tensor::<TestAutodiffBackend, 1, Int>::from_ints(values, &device);
        let item_seq  = ints(&[0, 0, 3, 4, 5]).reshape([1, 5]);
        let next      = ints(&[6]);
        let negatives = ints(&[7, 8, 9, 10, 11]).reshape([1, 5]);

        let rows = |m: &FmlpRec<TestAutodiffBackend>| -> Vec<Vec<f32>> {
            let w: Vec<f32> = m.embeddings.item_embeddings.weight.val().into_data().to_vec().unwrap();
            w.chunks(8).map(<[f32]>::to_vec).collect()
        };
        let before = rows(&model);

        let loss  = model.compute_loss(item_seq, next, negatives, &mut rng).unwrap();
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        let mut optim = AdamConfig::new().init::<TestAutodiffBackend, FmlpRec<TestAutodiffBackend>>();
        let model = optim.step(1e-2, model, grads);
        let after = rows(&model);

        for item in 0..12 {
            let touched = (3..12).contains(&item);
            let moved = before[item] != after[item];
            assert_eq!(moved, touched, "item {item}: moved={moved}, expected {touched}");
        }
    }

    #[test]
    fn test_init_refuses_bad_config() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(0);

        let cfg = FmlpConfig::new(20).with_loss_type(LossType::Bpr);
        assert!(matches!(
            cfg.init::<TestBackend>(&device, &mut rng),
            Err(ModelError::UnsupportedLossType(_))
        ));

        let cfg = FmlpConfig::new(20)
            .with_hidden_size(10)
            .with_num_attention_heads(4)
            .with_token_mixer(TokenMixerKind::Attention);
        assert!(matches!(
            cfg.init::<TestBackend>(&device, &mut rng),
            Err(ModelError::HeadsNotDivisible { .. })
        ));
    }
}
