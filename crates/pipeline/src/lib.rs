//! Appointment no-show pipeline
//!
//! Wires the encoder, trainer and model store together into the two
//! operations callers need: train a model from historical appointments, and
//! score pending appointments against a stored model.
//!
//! ```no_run
//! use chrono::{NaiveDate, Utc};
//! use noshow_pipeline::{predict_pending, train, AppointmentSource, CsvAppointmentSource};
//! use noshow_store::FsModelStore;
//! use noshow_trainer::ForestParams;
//!
//! # fn main() -> noshow_core::Result<()> {
//! let store = FsModelStore::open("./models")?;
//! let source = CsvAppointmentSource::new("appointments.csv");
//! let today = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
//!
//! let tag = train(&store, ForestParams::default(), &source.historical(today)?, today, Utc::now())?;
//! let results = predict_pending(&store, &source.pending(today)?, Some(&tag))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod predictor;
pub mod source;
pub mod training;

use chrono::{DateTime, NaiveDate, Utc};
use noshow_core::{AppointmentRecord, PredictionResult, Result, VersionTag};
use noshow_store::ModelStore;
use noshow_trainer::ForestParams;

pub use config::{DataConfig, LoggingConfig, PipelineConfig, StoreConfig};
pub use predictor::Predictor;
pub use source::{AppointmentSource, CsvAppointmentSource, InMemorySource};
pub use training::NoShowTrainer;

/// Train on `historical` and commit the model, returning its tag
pub fn train<S: ModelStore>(
    store: S,
    params: ForestParams,
    historical: &[AppointmentRecord],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<VersionTag> {
    NoShowTrainer::new(store, params).train(historical, today, now)
}

/// Score `pending` with the model tagged `version` (latest when `None`)
pub fn predict_pending<S: ModelStore>(
    store: S,
    pending: &[AppointmentRecord],
    version: Option<&VersionTag>,
) -> Result<Vec<PredictionResult>> {
    Predictor::new(store).predict_pending(pending, version)
}
