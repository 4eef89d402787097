//! Training-time feature schema and reconciliation of live batches against it

use crate::errors::{NoShowError, Result};
use crate::features::{EncodedBatch, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Ordered column names a model was fit on.
///
/// Produced by encoding the training batch, persisted next to the model and
/// only ever read at prediction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from explicit column names, rejecting unusable ones.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    /// Encoder output is unique and non-empty by construction.
    pub(crate) fn from_encoder(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// A schema reconciliation can work against: non-empty, no duplicate names.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(NoShowError::SchemaMismatch("schema has no columns".to_string()));
        }
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.is_empty() {
                return Err(NoShowError::SchemaMismatch("schema has an unnamed column".to_string()));
            }
            if !seen.insert(column.as_str()) {
                return Err(NoShowError::SchemaMismatch(format!(
                    "column {column:?} appears more than once"
                )));
            }
        }
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// Project `batch` onto this schema's column order.
    ///
    /// Training columns observed in the batch are copied, training columns
    /// the batch never realised are zero-filled, and batch columns unknown to
    /// the schema are dropped. A partial mismatch is the normal case and is
    /// never an error; only an unusable schema is.
    pub fn reconcile(&self, batch: &EncodedBatch) -> Result<ReconciledMatrix> {
        self.validate()?;

        let observed: HashMap<&str, usize> = batch
            .columns()
            .names()
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();

        let mut sources = Vec::with_capacity(self.columns.len());
        let mut matched = Vec::new();
        let mut zero_filled = Vec::new();
        for column in &self.columns {
            match observed.get(column.as_str()) {
                Some(&idx) => {
                    sources.push(Some(idx));
                    matched.push(column.clone());
                }
                None => {
                    sources.push(None);
                    zero_filled.push(column.clone());
                }
            }
        }

        let dropped = batch
            .columns()
            .names()
            .iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect();

        let rows = batch
            .rows()
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|src| src.map_or(0, |idx| row[idx]))
                    .collect::<FeatureVector>()
            })
            .collect();

        Ok(ReconciledMatrix {
            rows,
            matched,
            zero_filled,
            dropped,
        })
    }
}

/// Batch projected onto a training schema, plus what the projection did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledMatrix {
    /// Rows in input order, each exactly `schema.len()` wide
    pub rows: Vec<FeatureVector>,
    /// Training columns the batch realised
    pub matched: Vec<String>,
    /// Training columns absent from the batch (filled with zero)
    pub zero_filled: Vec<String>,
    /// Batch columns unknown to the schema
    pub dropped: Vec<String>,
}

impl ReconciledMatrix {
    /// Width of every row, always the schema length
    pub fn width(&self) -> usize {
        self.matched.len() + self.zero_filled.len()
    }
}
