// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// One CSV row per evaluated epoch:
//
//   epoch,train_loss,hit,ndcg,mrr
//   1,1.386201,0.052000,0.024310,0.016120
//   2,1.201944,0.071000,0.033001,0.021783
//
// hit / ndcg / mrr are the validation ranking metrics at the
// configured cut-off K. The file is appended to, so several
// runs in one directory accumulate.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::ml::evaluator::RankingMetrics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    /// Mean pairwise loss over the epoch's training batches
    pub train_loss: f64,
    pub valid:      RankingMetrics,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, valid: RankingMetrics) -> Self {
        Self { epoch, train_loss, valid }
    }

    /// Model selection compares MRR@K.
    pub fn is_improvement(&self, best_mrr: f64) -> bool {
        self.valid.mrr > best_mrr
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,hit,ndcg,mrr")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.valid.hit, m.valid.ndcg, m.valid.mrr,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
