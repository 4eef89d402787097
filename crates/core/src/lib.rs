//! Core of the appointment no-show pipeline
//!
//! Turns appointment records into fixed-schema feature vectors and scores
//! them with a deterministic, integer-only random forest.
//!
//! Modules:
//! - `record`: Appointment rows as supplied by the data store
//! - `features`: One-hot encoding of a batch of records
//! - `schema`: Training-time column schema and reconciliation against it
//! - `forest`: Classification trees and forest scoring
//! - `artifact`: Trained model artifacts and version tags
//! - `risk`: Probability to risk-category bucketing
//! - `serde_canon`: Canonical JSON and BLAKE3 hashing
//! - `errors`: Error taxonomy shared by every layer

pub mod artifact;
pub mod errors;
pub mod features;
pub mod forest;
pub mod record;
pub mod risk;
pub mod schema;
pub mod serde_canon;

pub use artifact::{ModelSelector, TrainedModel, VersionTag};
pub use errors::{NoShowError, Result};
pub use features::{column_name, CategoricalField, EncodedBatch, FeatureEncoder, FeatureVector};
pub use forest::{ForestModel, Node, Tree, SCALE};
pub use record::AppointmentRecord;
pub use risk::{PredictionResult, RiskCategory, RiskSummary, HIGH_RISK_FROM, MEDIUM_RISK_FROM};
pub use schema::{FeatureSchema, ReconciledMatrix};
