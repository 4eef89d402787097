//! Deterministic random forest trainer for appointment no-show models
//!
//! Grows bagged CART classification trees with fixed-point arithmetic and
//! seeded per-tree RNG streams, so one seed and one input order always
//! produce the same forest.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod trainer;

use noshow_core::{AppointmentRecord, FeatureSchema, ForestModel, Result};

pub use cart::{CartBuilder, TreeConfig};
pub use dataset::LabeledDataset;
pub use deterministic::{mix_seed, LcgRng, SplitTieBreaker};
pub use trainer::{ForestParams, ForestTrainer};

/// Encode labeled `records` and fit a forest on them, returning the
/// column schema the forest expects alongside it.
pub fn train_forest(
    records: &[AppointmentRecord],
    params: ForestParams,
) -> Result<(FeatureSchema, ForestModel)> {
    let dataset = LabeledDataset::from_records(records)?;
    let forest = ForestTrainer::new(params).fit(&dataset)?;
    Ok((dataset.schema, forest))
}
