// ============================================================
// Layer 4 — Atomic Interaction File Loader
// ============================================================
// Reads the tab separated `.inter` format:
//
//   user_id:token   item_id:token   rating:float   timestamp:float
//   196             242             3              881250949
//   186             302             3              891717742
//
// The header names every column as `name:type`. Columns are
// found by name, so their order and any extra columns do not
// matter. `user_id` and `item_id` are required; `timestamp` is
// optional and, when present, must parse as a number.
//
// A row that is too short or has an unparsable timestamp is
// skipped with a warning rather than aborting the whole load.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};

use crate::domain::interaction::Interaction;
use crate::domain::traits::InteractionSource;

pub const USER_FIELD:      &str = "user_id";
pub const ITEM_FIELD:      &str = "item_id";
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Loads one `.inter` file. Implements InteractionSource.
pub struct AtomicFileLoader {
    path: PathBuf,
}

impl AtomicFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/<dataset>/<dataset>.inter`
    pub fn for_dataset(data_dir: impl AsRef<Path>, dataset: &str) -> Self {
        Self::new(data_dir.as_ref().join(dataset).join(format!("{dataset}.inter")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InteractionSource for AtomicFileLoader {
    fn load_all(&self) -> Result<Vec<Interaction>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open interaction file '{}'", self.path.display()))?;
        let interactions = parse_atomic(BufReader::new(file), &self.path.display().to_string())?;
        tracing::info!(
            "Loaded {} interactions from '{}'",
            interactions.len(),
            self.path.display()
        );
        Ok(interactions)
    }
}

/// Column positions resolved from the header line.
#[derive(Debug, PartialEq)]
struct Columns {
    user:      usize,
    item:      usize,
    timestamp: Option<usize>,
}

impl Columns {
    fn from_header(header: &str, source: &str) -> Result<Self> {
        let names: Vec<&str> = header
            .trim_end_matches(['\r', '\n'])
            .split('\t')
            .map(|field| field.split(':').next().unwrap_or(field).trim())
            .collect();
        let find = |name: &str| names.iter().position(|n| *n == name);

        let Some(user) = find(USER_FIELD) else {
            bail!("'{source}' has no '{USER_FIELD}' column (header: {header:?})");
        };
        let Some(item) = find(ITEM_FIELD) else {
            bail!("'{source}' has no '{ITEM_FIELD}' column (header: {header:?})");
        };
        Ok(Self { user, item, timestamp: find(TIMESTAMP_FIELD) })
    }

    fn width(&self) -> usize {
        self.user.max(self.item).max(self.timestamp.unwrap_or(0)) + 1
    }
}

/// Parse an atomic file from any reader. `source` only labels messages.
pub fn parse_atomic(reader: impl BufRead, source: &str) -> Result<Vec<Interaction>> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.with_context(|| format!("Cannot read header of '{source}'"))?,
        None => bail!("'{source}' is empty"),
    };
    let columns = Columns::from_header(&header, source)?;

    let mut interactions = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in lines.enumerate() {
        let line = line.with_context(|| format!("Cannot read '{source}' at line {}", line_no + 2))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < columns.width() {
            tracing::warn!("Skipping '{}' line {}: {} fields", source, line_no + 2, fields.len());
            skipped += 1;
            continue;
        }

        let timestamp = match columns.timestamp {
            None => None,
            Some(col) => match fields[col].trim().parse::<f64>() {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::warn!("Skipping '{}' line {}: timestamp {:?}: {}", source, line_no + 2, fields[col], e);
                    skipped += 1;
                    continue;
                }
            },
        };

        interactions.push(Interaction::new(
            fields[columns.user].trim(),
            fields[columns.item].trim(),
            timestamp,
        ));
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} malformed rows in '{}'", skipped, source);
    }
    tracing::debug!("Parsed {} rows from '{}'", interactions.len(), source);
    Ok(interactions)
}
