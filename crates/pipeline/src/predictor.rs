//! Scoring side of the pipeline: pending rows in, risk categories out

use noshow_core::{
    AppointmentRecord, FeatureEncoder, ModelSelector, NoShowError, PredictionResult, Result,
    RiskSummary, TrainedModel, VersionTag,
};
use noshow_store::ModelStore;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

/// Scores pending appointments against a stored model
pub struct Predictor<S> {
    store: S,
}

impl<S: ModelStore> Predictor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Score `records` with the model tagged `version`, or the latest one.
    ///
    /// The model is loaded before anything else, so an empty store is
    /// reported as `ModelNotFound` whatever the batch looks like.
    #[instrument(skip_all, fields(pending = records.len(), version = ?version.map(VersionTag::as_str)))]
    pub fn predict_pending(
        &self,
        records: &[AppointmentRecord],
        version: Option<&VersionTag>,
    ) -> Result<Vec<PredictionResult>> {
        let model = self.store.load(&ModelSelector::from(version))?;
        debug!(tag = %model.version, hash = %model.model_hash, "model loaded");
        Self::predict_with(&model, records)
    }

    /// Score `records` with an explicit model. Results follow input order.
    pub fn predict_with(model: &TrainedModel, records: &[AppointmentRecord]) -> Result<Vec<PredictionResult>> {
        if records.is_empty() {
            return Err(NoShowError::EmptyInput);
        }

        let batch = FeatureEncoder::new().encode(records)?;
        let matrix = model.schema.reconcile(&batch)?;
        info!(
            tag = %model.version,
            matched = matrix.matched.len(),
            zero_filled = matrix.zero_filled.len(),
            dropped = matrix.dropped.len(),
            "pending batch reconciled"
        );
        if !matrix.dropped.is_empty() {
            debug!(columns = ?matrix.dropped, "columns unknown to the model");
        }

        let results = records
            .par_iter()
            .zip(matrix.rows.par_iter())
            .map(|(record, row)| {
                model
                    .forest
                    .predict_proba(row)
                    .map(|probability| PredictionResult::new(record.id, probability))
            })
            .collect::<Result<Vec<_>>>()?;

        let summary = RiskSummary::from_results(&results);
        info!(
            low = summary.low,
            medium = summary.medium,
            high = summary.high,
            "pending appointments scored"
        );
        Ok(results)
    }
}
