// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one goal at a time:
// training a model from a dataset, or recommending items
// for a history with a trained model.
//
// Rules for this layer:
//   - No model math here (Layer 5)
//   - No argument parsing or printing (Layer 1)
//   - No direct file formats (Layers 4 and 6)
//   - Only workflow coordination

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// The training workflow
pub mod train_use_case;

// The recommendation workflow
pub mod recommend_use_case;

/// Which Burn backend runs the model. Chosen explicitly by the
/// caller; model construction never picks a device on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// CPU, pure Rust
    #[default]
    Ndarray,
    /// GPU through wgpu
    Wgpu,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ndarray" | "cpu" => Ok(BackendKind::Ndarray),
            "wgpu" | "gpu"    => Ok(BackendKind::Wgpu),
            other => Err(format!("unknown backend '{other}', expected ndarray or wgpu")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ndarray => write!(f, "ndarray"),
            BackendKind::Wgpu    => write!(f, "wgpu"),
        }
    }
}
