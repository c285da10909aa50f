// ============================================================
// Layer 5 — Model Configuration
// ============================================================
// The full set of hyperparameters the FMLP model recognises.
// The host passes one of these to `FmlpConfig::init`; nothing
// is read from the command line or the environment here.
//
// Invalid combinations are rejected by `validate()` before any
// parameter is allocated.

use std::{fmt, str::FromStr};

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ml::error::{ModelError, ModelResult};

/// Nonlinearity between the two affine maps of the feed-forward sublayer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Gelu,
    Relu,
}

impl FromStr for Activation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gelu" => Ok(Activation::Gelu),
            "relu" => Ok(Activation::Relu),
            _      => Err(ModelError::UnsupportedActivation(s.to_string())),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Gelu => write!(f, "gelu"),
            Activation::Relu => write!(f, "relu"),
        }
    }
}

/// Which token-mixing sublayer every encoder block uses.
/// Chosen once at construction; blocks never switch modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenMixerKind {
    /// Learned global filter applied in the frequency domain.
    Filter,
    /// Multi-head self-attention driven by the causal mask.
    Attention,
}

impl FromStr for TokenMixerKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "filter"    => Ok(TokenMixerKind::Filter),
            "attention" => Ok(TokenMixerKind::Attention),
            _ => Err(ModelError::InvalidConfig(format!(
                "unknown token mixer '{s}', expected filter or attention"
            ))),
        }
    }
}

/// Loss names the host framework may request.
/// Only `Ce` (pairwise logistic loss over sampled negatives) is implemented;
/// anything else is refused at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LossType {
    Ce,
    Bpr,
}

impl FromStr for LossType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CE"  => Ok(LossType::Ce),
            "BPR" => Ok(LossType::Bpr),
            _     => Err(ModelError::UnsupportedLossType(s.to_string())),
        }
    }
}

impl fmt::Display for LossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossType::Ce  => write!(f, "CE"),
            LossType::Bpr => write!(f, "BPR"),
        }
    }
}

#[derive(Config, Debug)]
pub struct FmlpConfig {
    /// Catalog size including the padding id 0.
    pub item_size: usize,
    #[config(default = 64)]
    pub hidden_size: usize,
    #[config(default = 2)]
    pub num_hidden_layers: usize,
    #[config(default = 2)]
    pub num_attention_heads: usize,
    #[config(default = "Activation::Gelu")]
    pub hidden_act: Activation,
    #[config(default = 0.5)]
    pub attention_probs_dropout_prob: f64,
    #[config(default = 0.5)]
    pub hidden_dropout_prob: f64,
    /// Standard deviation of the normal initialiser for affine and embedding weights.
    #[config(default = 0.02)]
    pub initializer_range: f64,
    #[config(default = 50)]
    pub max_seq_length: usize,
    #[config(default = "TokenMixerKind::Filter")]
    pub token_mixer: TokenMixerKind,
    #[config(default = "LossType::Ce")]
    pub loss_type: LossType,
    /// Average the training loss only over positions whose target is a real item.
    #[config(default = false)]
    pub mask_padded_targets: bool,
}

impl FmlpConfig {
    /// Check every hyperparameter. Called by `init`, and by the CLI
    /// before any data is loaded so bad flags fail fast.
    pub fn validate(&self) -> ModelResult<()> {
        if self.item_size < 2 {
            return Err(ModelError::InvalidConfig(format!(
                "item_size must cover the padding id and at least one item, got {}",
                self.item_size
            )));
        }
        if self.hidden_size == 0 {
            return Err(ModelError::InvalidConfig("hidden_size must be positive".into()));
        }
        if self.num_hidden_layers == 0 {
            return Err(ModelError::InvalidConfig("num_hidden_layers must be positive".into()));
        }
        if self.max_seq_length == 0 {
            return Err(ModelError::InvalidConfig("max_seq_length must be positive".into()));
        }
        check_probability("hidden_dropout_prob", self.hidden_dropout_prob)?;
        check_probability("attention_probs_dropout_prob", self.attention_probs_dropout_prob)?;
        if !(self.initializer_range.is_finite() && self.initializer_range > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "initializer_range must be a positive finite number, got {}",
                self.initializer_range
            )));
        }

        if self.token_mixer == TokenMixerKind::Attention {
            if self.num_attention_heads == 0 {
                return Err(ModelError::InvalidConfig("num_attention_heads must be positive".into()));
            }
            if self.hidden_size % self.num_attention_heads != 0 {
                return Err(ModelError::HeadsNotDivisible {
                    hidden_size: self.hidden_size,
                    num_heads:   self.num_attention_heads,
                });
            }
        }

        if self.loss_type != LossType::Ce {
            return Err(ModelError::UnsupportedLossType(self.loss_type.to_string()));
        }
        Ok(())
    }

    /// Width of the feed-forward inner layer.
    pub fn intermediate_size(&self) -> usize {
        self.hidden_size * 4
    }
}

fn check_probability(name: &str, p: f64) -> ModelResult<()> {
    if (0.0..1.0).contains(&p) {
        Ok(())
    } else {
        Err(ModelError::InvalidConfig(format!("{name} must lie in [0, 1), got {p}")))
    }
}
