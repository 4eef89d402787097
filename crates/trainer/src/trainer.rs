//! Random forest trainer
//!
//! Bags CART classification trees over bootstrap resamples of the labeled
//! matrix. Each tree draws from its own RNG stream derived from the forest
//! seed and its index, so trees can be grown in parallel and the result
//! is still reproducible.

use noshow_core::{ForestModel, NoShowError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::LabeledDataset;
use crate::deterministic::LcgRng;

/// Forest training configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` means `floor(sqrt(feature_count))`
    pub max_features: Option<usize>,
    /// Resample rows with replacement for each tree
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 32,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<()> {
        let problem = if self.n_trees == 0 {
            Some("n_trees must be at least 1")
        } else if self.max_depth == 0 {
            Some("max_depth must be at least 1")
        } else if self.min_samples_split < 2 {
            Some("min_samples_split must be at least 2")
        } else if self.min_samples_leaf == 0 {
            Some("min_samples_leaf must be at least 1")
        } else if self.max_features == Some(0) {
            Some("max_features must be at least 1")
        } else {
            None
        };

        match problem {
            Some(reason) => Err(NoShowError::InvalidParameters(reason.to_string())),
            None => Ok(()),
        }
    }

    /// Effective per-split feature budget for a matrix `feature_count` wide
    pub fn features_per_split(&self, feature_count: usize) -> usize {
        let default = ((feature_count as f64).sqrt() as usize).max(1);
        self.max_features.unwrap_or(default).min(feature_count).max(1)
    }
}

/// Random forest trainer
pub struct ForestTrainer {
    params: ForestParams,
}

impl ForestTrainer {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    /// Fit a forest on `dataset`
    pub fn fit(&self, dataset: &LabeledDataset) -> Result<ForestModel> {
        self.params.validate()?;
        if dataset.is_empty() {
            return Err(NoShowError::EmptyInput);
        }

        let feature_count = dataset.feature_count();
        let tree_config = TreeConfig {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: self.params.features_per_split(feature_count),
        };

        tracing::info!(
            trees = self.params.n_trees,
            rows = dataset.len(),
            features = feature_count,
            max_features = tree_config.max_features,
            seed = self.params.seed,
            "growing forest"
        );

        let builder = CartBuilder::new(&dataset.features, &dataset.labels, tree_config);
        let n_rows = dataset.len();

        let trees = (0..self.params.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = LcgRng::for_tree(self.params.seed, tree_idx);
                let sample: Vec<usize> = if self.params.bootstrap {
                    rng.bootstrap_indices(n_rows)
                } else {
                    (0..n_rows).collect()
                };
                let tree = builder.build(&sample, &mut rng);
                tracing::trace!(tree = tree_idx, nodes = tree.nodes.len(), leaves = tree.leaf_count(), "tree grown");
                tree
            })
            .collect();

        Ok(ForestModel::new(trees, feature_count, self.params.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noshow_core::FeatureSchema;

    fn create_simple_dataset() -> LabeledDataset {
        LabeledDataset {
            schema: FeatureSchema::new(vec!["a=1".into(), "b=1".into()]).unwrap(),
            features: vec![vec![1, 0], vec![1, 0], vec![0, 1], vec![0, 1], vec![1, 1], vec![0, 0]],
            labels: vec![true, true, false, false, true, false],
        }
    }

    fn small_params(n_trees: usize) -> ForestParams {
        ForestParams {
            n_trees,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_train_simple_forest() {
        let forest = ForestTrainer::new(small_params(8)).fit(&create_simple_dataset()).unwrap();

        assert_eq!(forest.num_trees(), 8);
        assert_eq!(forest.feature_count, 2);
        assert_eq!(forest.seed, 42);
        assert!(forest.validate().is_ok());

        let p_absent = forest.predict_proba(&[1, 0]).unwrap();
        let p_present = forest.predict_proba(&[0, 1]).unwrap();
        assert!(p_absent > p_present);
    }

    #[test]
    fn test_determinism() {
        let dataset = create_simple_dataset();
        let model1 = ForestTrainer::new(small_params(16)).fit(&dataset).unwrap();
        let model2 = ForestTrainer::new(small_params(16)).fit(&dataset).unwrap();

        assert_eq!(model1, model2);
        assert_eq!(model1.hash_hex().unwrap(), model2.hash_hex().unwrap());
    }

    #[test]
    fn test_seed_changes_forest() {
        let dataset = create_simple_dataset();
        let a = ForestTrainer::new(small_params(16)).fit(&dataset).unwrap();
        let b = ForestTrainer::new(ForestParams {
            seed: 7,
            ..small_params(16)
        })
        .fit(&dataset)
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_without_bootstrap_trees_see_all_rows() {
        let params = ForestParams {
            bootstrap: false,
            max_features: Some(2),
            ..small_params(3)
        };
        let forest = ForestTrainer::new(params).fit(&create_simple_dataset()).unwrap();

        // Without resampling or feature sampling every tree is the same
        assert!(forest.trees.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_params_validation() {
        assert!(ForestParams::default().validate().is_ok());
        for bad in [
            ForestParams { n_trees: 0, ..ForestParams::default() },
            ForestParams { max_depth: 0, ..ForestParams::default() },
            ForestParams { min_samples_split: 1, ..ForestParams::default() },
            ForestParams { min_samples_leaf: 0, ..ForestParams::default() },
            ForestParams { max_features: Some(0), ..ForestParams::default() },
        ] {
            assert!(matches!(bad.validate(), Err(NoShowError::InvalidParameters(_))));
        }
    }

    #[test]
    fn test_features_per_split() {
        let params = ForestParams::default();
        assert_eq!(params.features_per_split(6), 2);
        assert_eq!(params.features_per_split(1), 1);
        assert_eq!(params.features_per_split(100), 10);

        let explicit = ForestParams {
            max_features: Some(50),
            ..ForestParams::default()
        };
        assert_eq!(explicit.features_per_split(6), 6);
    }
}
