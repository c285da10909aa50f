// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// `train` flags default to the reference launcher settings
// (ml-100k, 60 epochs, 4 layers, hidden 128, lr 1e-4, seed 3232).
// Enum-valued flags are parsed with FromStr, so an unknown
// activation, loss or backend name is rejected up front.

use clap::{Args, Subcommand};

use crate::application::{train_use_case::TrainConfig, BackendKind};
use crate::ml::config::{Activation, LossType, TokenMixerKind};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the model on an atomic `.inter` dataset
    Train(TrainArgs),

    /// Recommend items for a history using a trained checkpoint
    Recommend(RecommendArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding one sub-directory per dataset
    #[arg(long, default_value = "dataset")]
    pub data_dir: String,

    /// Dataset name; reads <data-dir>/<dataset>/<dataset>.inter
    #[arg(long, default_value = "ml-100k")]
    pub dataset: String,

    /// Directory for checkpoints, config, vocabulary and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Burn backend: ndarray (CPU) or wgpu (GPU)
    #[arg(long, default_value = "ndarray")]
    pub backend: BackendKind,

    #[arg(long, default_value_t = 60)]
    pub epochs: usize,

    #[arg(long, default_value_t = 256)]
    pub train_batch_size: usize,

    #[arg(long, default_value_t = 512)]
    pub eval_batch_size: usize,

    #[arg(long, default_value_t = 1e-4)]
    pub learning_rate: f64,

    /// Validate every N epochs
    #[arg(long, default_value_t = 1)]
    pub eval_step: usize,

    /// Stop after this many validations without improvement
    #[arg(long, default_value_t = 301)]
    pub stopping_step: usize,

    /// K for Hit@K, NDCG@K and MRR@K
    #[arg(long, default_value_t = 10)]
    pub topk: usize,

    #[arg(long, default_value_t = 3232)]
    pub seed: u64,

    /// Histories are truncated / left-padded to this length
    #[arg(long, default_value_t = 50)]
    pub max_seq_length: usize,

    #[arg(long, default_value_t = 128)]
    pub hidden_size: usize,

    /// Number of encoder blocks
    #[arg(long, default_value_t = 4)]
    pub n_layers: usize,

    /// Attention heads (attention mixer only); must divide hidden-size
    #[arg(long, default_value_t = 2)]
    pub n_heads: usize,

    #[arg(long, default_value_t = 0.5)]
    pub hidden_dropout_prob: f64,

    #[arg(long, default_value_t = 0.5)]
    pub attn_dropout_prob: f64,

    /// gelu or relu
    #[arg(long, default_value = "gelu")]
    pub hidden_act: Activation,

    #[arg(long, default_value_t = 0.02)]
    pub initializer_range: f64,

    /// Token mixing sublayer: filter or attention
    #[arg(long, default_value = "filter")]
    pub token_mixer: TokenMixerKind,

    /// Only CE is implemented; other names are refused
    #[arg(long, default_value = "CE")]
    pub loss_type: LossType,

    /// Average the loss only over non-padding targets
    #[arg(long)]
    pub mask_padded_targets: bool,
}

/// The boundary between Layer 1 and Layer 2: the application
/// layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            dataset:        a.dataset,
            checkpoint_dir: a.checkpoint_dir,
            backend:        a.backend,

            epochs:           a.epochs,
            train_batch_size: a.train_batch_size,
            eval_batch_size:  a.eval_batch_size,
            learning_rate:    a.learning_rate,
            eval_step:        a.eval_step,
            stopping_step:    a.stopping_step,
            topk:             a.topk,
            seed:             a.seed,

            max_seq_length:      a.max_seq_length,
            hidden_size:         a.hidden_size,
            n_layers:            a.n_layers,
            n_heads:             a.n_heads,
            hidden_dropout_prob: a.hidden_dropout_prob,
            attn_dropout_prob:   a.attn_dropout_prob,
            hidden_act:          a.hidden_act,
            initializer_range:   a.initializer_range,
            token_mixer:         a.token_mixer,
            loss_type:           a.loss_type,
            mask_padded_targets: a.mask_padded_targets,
        }
    }
}

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Item tokens, oldest first
    #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
    pub history: Vec<String>,

    #[arg(long, default_value_t = 10)]
    pub top_k: usize,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "ndarray")]
    pub backend: BackendKind,
}
