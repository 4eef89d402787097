//! One-hot feature encoding of appointment records
//!
//! Every record contributes three categorical fields (specialty, day of week,
//! hour of day). Each field is expanded into `field=value` indicator columns
//! covering exactly the values observed in the batch being encoded, so two
//! batches may legitimately produce different column sets. Projecting a batch
//! onto a stored training schema is done by [`FeatureSchema::reconcile`].

use crate::errors::{NoShowError, Result};
use crate::record::AppointmentRecord;
use crate::schema::FeatureSchema;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Feature vector (one-hot integers, ordered by the batch's columns)
pub type FeatureVector = Vec<i64>;

/// Categorical fields derived from an appointment, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoricalField {
    Specialty,
    DayOfWeek,
    Hour,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::Specialty,
        CategoricalField::DayOfWeek,
        CategoricalField::Hour,
    ];

    /// Column prefix used in `field=value` names
    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::Specialty => "specialty",
            CategoricalField::DayOfWeek => "day_of_week",
            CategoricalField::Hour => "hour",
        }
    }

    fn extract(self, record: &AppointmentRecord) -> FieldValue {
        match self {
            CategoricalField::Specialty => FieldValue::Text(record.specialty.clone()),
            CategoricalField::DayOfWeek => FieldValue::Ordinal(record.day_of_week()),
            CategoricalField::Hour => FieldValue::Ordinal(record.hour()),
        }
    }
}

/// A realised categorical value. Ordinals sort numerically, text lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum FieldValue {
    Ordinal(u32),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Ordinal(v) => write!(f, "{v}"),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

/// Build the `field=value` column name for an indicator column.
pub fn column_name(field: CategoricalField, value: impl fmt::Display) -> String {
    format!("{}={}", field.name(), value)
}

/// Encoded matrix together with the columns observed in its source batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    columns: FeatureSchema,
    rows: Vec<FeatureVector>,
}

impl EncodedBatch {
    /// Observed columns, in encoding order
    pub fn columns(&self) -> &FeatureSchema {
        &self.columns
    }

    /// Matrix rows, one per input record, in input order
    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, or `None` if either is unknown
    pub fn value(&self, row: usize, column: &str) -> Option<i64> {
        let idx = self.columns.position(column)?;
        self.rows.get(row).map(|r| r[idx])
    }

    pub fn into_parts(self) -> (FeatureSchema, Vec<FeatureVector>) {
        (self.columns, self.rows)
    }
}

/// Stateless one-hot encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode `records` into a one-hot matrix.
    ///
    /// Columns are grouped by field (specialty, day of week, hour), values
    /// ascending within a field. Fails with [`NoShowError::EmptyInput`] when
    /// `records` is empty.
    pub fn encode(&self, records: &[AppointmentRecord]) -> Result<EncodedBatch> {
        if records.is_empty() {
            return Err(NoShowError::EmptyInput);
        }

        let mut observed: Vec<BTreeSet<FieldValue>> = vec![BTreeSet::new(); CategoricalField::ALL.len()];
        for record in records {
            for (slot, field) in CategoricalField::ALL.iter().enumerate() {
                observed[slot].insert(field.extract(record));
            }
        }

        let mut names = Vec::new();
        let mut index = HashMap::new();
        for (slot, field) in CategoricalField::ALL.iter().enumerate() {
            for value in &observed[slot] {
                index.insert((*field, value.clone()), names.len());
                names.push(column_name(*field, value));
            }
        }

        let width = names.len();
        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![0i64; width];
                for field in CategoricalField::ALL {
                    if let Some(&idx) = index.get(&(field, field.extract(record))) {
                        row[idx] = 1;
                    }
                }
                row
            })
            .collect();

        tracing::debug!(rows = records.len(), columns = width, "encoded appointment batch");

        Ok(EncodedBatch {
            columns: FeatureSchema::from_encoder(names),
            rows,
        })
    }
}
