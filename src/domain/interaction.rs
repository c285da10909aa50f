// ============================================================
// Layer 3 — Interaction Domain Type
// ============================================================
// The atomic unit of a sequential recommendation dataset:
// "user U interacted with item I at time T".
//
// Users and items are kept as the raw tokens found in the
// source file. Mapping items to dense model ids happens in
// the data layer (see data::vocab), so the domain never sees
// the padding convention.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Raw user token from the source file
    pub user: String,

    /// Raw item token from the source file
    pub item: String,

    /// Event time. `None` when the source has no timestamp column;
    /// file order is then the only ordering available.
    pub timestamp: Option<f64>,
}

impl Interaction {
    pub fn new(user: impl Into<String>, item: impl Into<String>, timestamp: Option<f64>) -> Self {
        Self {
            user: user.into(),
            item: item.into(),
            timestamp,
        }
    }
}

/// A single item with the score the model gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item:  String,
    pub score: f32,
}
