//! Bagged classification forest with integer-only scoring
//!
//! The forest probability of the positive class is the mean of the tree leaf
//! probabilities. All arithmetic stays in fixed point so identical models
//! score identically on every platform; the `f64` view is only produced at
//! the very end.

use super::tree::Tree;
use crate::errors::{NoShowError, Result};
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};
use serde::{Deserialize, Serialize};

/// Fixed-point scale for probabilities (1e6 = probability 1.0)
pub const SCALE: i64 = 1_000_000;

/// Current artifact format version
pub const FOREST_FORMAT_VERSION: i32 = 1;

/// Random forest of classification trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForestModel {
    /// Artifact format version
    pub version: i32,

    /// Fixed-point scale of leaf probabilities
    pub scale: i64,

    /// Width of the feature vectors the forest was fit on
    pub feature_count: usize,

    /// Seed the forest was grown from
    pub seed: u64,

    /// Trees in the ensemble
    pub trees: Vec<Tree>,
}

impl ForestModel {
    pub fn new(trees: Vec<Tree>, feature_count: usize, seed: u64) -> Self {
        Self {
            version: FOREST_FORMAT_VERSION,
            scale: SCALE,
            feature_count,
            seed,
            trees,
        }
    }

    /// Validate model structure
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.version != FOREST_FORMAT_VERSION {
            return Err(format!("unsupported forest version: {}", self.version));
        }
        if self.scale <= 0 {
            return Err(format!("invalid scale: {}", self.scale));
        }
        if self.feature_count == 0 {
            return Err("forest was fit on zero features".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_count, self.scale)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    /// Positive-class probability at `scale` precision.
    ///
    /// Fails with [`NoShowError::SchemaMismatch`] when `features` is not
    /// exactly as wide as the training matrix.
    pub fn predict_proba_fixed(&self, features: &[i64]) -> Result<i64> {
        if features.len() != self.feature_count {
            return Err(NoShowError::SchemaMismatch(format!(
                "forest expects {} features, got {}",
                self.feature_count,
                features.len()
            )));
        }
        if self.trees.is_empty() {
            return Ok(0);
        }

        let sum: i128 = self
            .trees
            .iter()
            .map(|tree| tree.evaluate(features) as i128)
            .sum();
        let mean = sum / self.trees.len() as i128;
        Ok(mean.clamp(0, self.scale as i128) as i64)
    }

    /// Positive-class probability in `[0, 1]`
    pub fn predict_proba(&self, features: &[i64]) -> Result<f64> {
        let fixed = self.predict_proba_fixed(features)?;
        Ok(fixed as f64 / self.scale as f64)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(to_canonical_json(self)?)
    }

    /// BLAKE3 hash of the canonical JSON, hex encoded
    pub fn hash_hex(&self) -> Result<String> {
        Ok(hash_canonical_hex(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::tree::Node;

    fn create_test_forest() -> ForestModel {
        let tree1 = Tree::new(vec![
            Node::internal(0, 0, 0, 1, 2),
            Node::leaf(1, 200_000),
            Node::leaf(2, 800_000),
        ]);
        let tree2 = Tree::new(vec![
            Node::internal(0, 1, 0, 1, 2),
            Node::leaf(1, 400_000),
            Node::leaf(2, 1_000_000),
        ]);
        ForestModel::new(vec![tree1, tree2], 2, 42)
    }

    #[test]
    fn test_forest_creation() {
        let forest = create_test_forest();
        assert_eq!(forest.version, FOREST_FORMAT_VERSION);
        assert_eq!(forest.scale, SCALE);
        assert_eq!(forest.num_trees(), 2);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_probability_is_tree_mean() {
        let forest = create_test_forest();

        // Both go left: (200k + 400k) / 2
        assert_eq!(forest.predict_proba_fixed(&[0, 0]).unwrap(), 300_000);
        // Both go right: (800k + 1M) / 2
        assert_eq!(forest.predict_proba_fixed(&[1, 1]).unwrap(), 900_000);
        assert!((forest.predict_proba(&[1, 0]).unwrap() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let forest = create_test_forest();
        let err = forest.predict_proba(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, NoShowError::SchemaMismatch(_)));
    }

    #[test]
    fn test_validation_failures() {
        let mut empty = create_test_forest();
        empty.trees.clear();
        assert!(empty.validate().is_err());

        let mut bad_version = create_test_forest();
        bad_version.version = 99;
        assert!(bad_version.validate().is_err());

        let mut narrow = create_test_forest();
        narrow.feature_count = 1;
        assert!(narrow.validate().is_err());
    }

    #[test]
    fn test_hash_tracks_content() {
        let forest = create_test_forest();
        assert_eq!(forest.hash_hex().unwrap(), create_test_forest().hash_hex().unwrap());

        let mut other = create_test_forest();
        other.seed = 7;
        assert_ne!(forest.hash_hex().unwrap(), other.hash_hex().unwrap());
    }

    #[test]
    fn test_canonical_json_roundtrip() {
        let forest = create_test_forest();
        let json = forest.to_canonical_json().unwrap();
        assert!(!json.contains('\n'));
        let restored: ForestModel = serde_json::from_str(&json).unwrap();
        assert_eq!(forest, restored);
    }
}
