//! Labeled training matrix assembled from historical appointments

use noshow_core::{AppointmentRecord, FeatureEncoder, FeatureSchema, NoShowError, Result};

/// Encoded historical batch with one label per row (`true` = absent)
#[derive(Clone, Debug)]
pub struct LabeledDataset {
    pub schema: FeatureSchema,
    pub features: Vec<Vec<i64>>,
    pub labels: Vec<bool>,
}

impl LabeledDataset {
    /// Encode `records` and pair each row with its outcome flag.
    ///
    /// Every record must carry an outcome ([`NoShowError::IncompleteLabel`]
    /// otherwise) and both outcomes must be present
    /// ([`NoShowError::DegenerateLabels`]).
    pub fn from_records(records: &[AppointmentRecord]) -> Result<Self> {
        let labels = records
            .iter()
            .map(|r| r.absent.ok_or(NoShowError::IncompleteLabel { id: r.id }))
            .collect::<Result<Vec<bool>>>()?;

        let (schema, features) = FeatureEncoder::new().encode(records)?.into_parts();

        let positives = labels.iter().filter(|&&absent| absent).count();
        if positives == 0 || positives == labels.len() {
            return Err(NoShowError::DegenerateLabels {
                class: positives > 0,
                rows: labels.len(),
            });
        }

        Ok(Self {
            schema,
            features,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }

    /// Number of no-show rows
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&absent| absent).count()
    }
}
