//! Training side of the pipeline: historical rows in, committed model out

use chrono::{DateTime, NaiveDate, Utc};
use noshow_core::{AppointmentRecord, Result, TrainedModel, VersionTag};
use noshow_store::ModelStore;
use noshow_trainer::{ForestParams, ForestTrainer, LabeledDataset};
use tracing::{info, instrument};

/// Fits forests on historical appointments and commits them to a store
pub struct NoShowTrainer<S> {
    store: S,
    params: ForestParams,
}

impl<S: ModelStore> NoShowTrainer<S> {
    pub fn new(store: S, params: ForestParams) -> Self {
        Self { store, params }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Train on `records` and save the result under a fresh timestamp tag.
    #[instrument(skip_all, fields(records = records.len(), today = %today))]
    pub fn train(
        &self,
        records: &[AppointmentRecord],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<VersionTag> {
        let model = self.train_model(records, today, now)?;
        self.store.save(&model)?;

        info!(
            tag = %model.version,
            hash = %model.model_hash,
            trees = model.forest.num_trees(),
            "model committed"
        );
        Ok(model.version)
    }

    /// Train without committing. Records scheduled on or after `today`
    /// are skipped; every remaining record must carry an outcome.
    pub fn train_model(
        &self,
        records: &[AppointmentRecord],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TrainedModel> {
        self.params.validate()?;

        let historical: Vec<AppointmentRecord> = records
            .iter()
            .filter(|r| r.is_historical(today))
            .cloned()
            .collect();
        let skipped = records.len() - historical.len();
        if skipped > 0 {
            info!(skipped, "ignoring appointments that have not happened yet");
        }

        let dataset = LabeledDataset::from_records(&historical)?;
        let positives = dataset.positive_count();
        info!(
            rows = dataset.len(),
            no_shows = positives,
            attended = dataset.len() - positives,
            columns = dataset.feature_count(),
            "training set encoded"
        );

        let forest = ForestTrainer::new(self.params.clone()).fit(&dataset)?;

        let latest = self.store.latest_tag()?;
        let version = VersionTag::next_after(latest.as_ref(), now);
        let rows = dataset.len();

        TrainedModel::new(version, now, dataset.schema, forest, rows, positives)
    }
}
