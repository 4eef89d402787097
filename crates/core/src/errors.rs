//! Error types shared by every layer of the no-show pipeline

use thiserror::Error;

/// Errors surfaced by encoding, training, storage and prediction.
///
/// Each variant maps to a different operator action, so callers are expected
/// to match on them rather than treat the pipeline as failing generically.
#[derive(Error, Debug)]
pub enum NoShowError {
    /// Nothing to encode
    #[error("no appointment records to encode")]
    EmptyInput,

    /// A historical record reached the trainer without an outcome flag
    #[error("historical appointment {id} has no recorded outcome")]
    IncompleteLabel { id: u64 },

    /// Every training label belongs to the same class
    #[error("all {rows} training labels are absent={class}; need both outcomes to train")]
    DegenerateLabels { class: bool, rows: usize },

    /// No model stored under the requested tag (or no model at all)
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Reconciliation or scoring cannot proceed against the stored schema
    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A stored artifact exists but cannot be trusted
    #[error("corrupt model artifact {tag}: {reason}")]
    CorruptArtifact { tag: String, reason: String },

    /// The tag is already stored or being stored
    #[error("model version {0} already exists")]
    VersionConflict(String),

    /// The tag is not a legal version identifier
    #[error("invalid version tag: {0:?}")]
    InvalidVersionTag(String),

    /// Training parameters out of range
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Appointment data could not be read or parsed
    #[error("data source error: {0}")]
    DataSource(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NoShowError {
    /// True when no trained model exists yet for the requested selector.
    pub fn is_cold_start(&self) -> bool {
        matches!(self, NoShowError::ModelNotFound(_))
    }
}

/// Result type for no-show pipeline operations
pub type Result<T> = std::result::Result<T, NoShowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_is_distinguishable() {
        assert!(NoShowError::ModelNotFound("latest".into()).is_cold_start());
        assert!(!NoShowError::CorruptArtifact {
            tag: "v1".into(),
            reason: "hash mismatch".into(),
        }
        .is_cold_start());
        assert!(!NoShowError::EmptyInput.is_cold_start());
    }

    #[test]
    fn messages_name_the_offending_record() {
        let err = NoShowError::IncompleteLabel { id: 17 };
        assert_eq!(err.to_string(), "historical appointment 17 has no recorded outcome");
    }
}
