//! CART (Classification and Regression Tree) builder
//!
//! Grows one binary classification tree with Gini impurity, per-node
//! feature subsampling and fixed-point arithmetic only.

use noshow_core::forest::{Node, Tree, SCALE};
use std::collections::BTreeSet;

use crate::deterministic::{LcgRng, SplitTieBreaker};

/// Growth limits for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Non-constant features examined per node
    pub max_features: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: usize::MAX,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: i64,
    gain: i128,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: i64, gain: i128) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Builds classification trees over a shared labeled matrix
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<i64>],
    labels: &'a [bool],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [Vec<i64>], labels: &'a [bool], config: TreeConfig) -> Self {
        debug_assert_eq!(features.len(), labels.len());

        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            labels,
            feature_count,
        }
    }

    /// Grow a tree on `sample` (row indices, repeats allowed for bootstrap draws)
    pub fn build(&self, sample: &[usize], rng: &mut LcgRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(sample, 0, &mut nodes, rng);
        Tree::new(nodes)
    }

    /// Recursively build tree nodes, returning the index of the node created
    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>, rng: &mut LcgRng) -> i32 {
        let current_idx = nodes.len() as i32;
        let positives = self.count_positive(indices);

        let pure = positives == 0 || positives == indices.len();
        if pure || depth >= self.config.max_depth || indices.len() < self.config.min_samples_split {
            nodes.push(Node::leaf(current_idx, self.leaf_probability(indices.len(), positives)));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices, positives, rng) else {
            nodes.push(Node::leaf(current_idx, self.leaf_probability(indices.len(), positives)));
            return current_idx;
        };

        let (left_indices, right_indices) = self.split_samples(indices, split.feature_idx, split.threshold);

        // Reserve the slot; children are linked once they exist
        nodes.push(Node::internal(current_idx, split.feature_idx as i32, split.threshold, -1, -1));

        let left = self.build_node(&left_indices, depth + 1, nodes, rng);
        let right = self.build_node(&right_indices, depth + 1, nodes, rng);

        let node = &mut nodes[current_idx as usize];
        node.left = left;
        node.right = right;

        current_idx
    }

    /// Best Gini split over a random subset of the non-constant features
    fn find_best_split(&self, indices: &[usize], positives: usize, rng: &mut LcgRng) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..self.feature_count).collect();
        rng.shuffle(&mut order);

        let parent = gini_weighted(indices.len(), positives);
        let mut best: Option<SplitCandidate> = None;
        let mut examined = 0usize;

        for feature_idx in order {
            if examined >= self.config.max_features {
                break;
            }

            let thresholds = self.candidate_thresholds(indices, feature_idx);
            if thresholds.is_empty() {
                // Constant within this node; doesn't count towards max_features
                continue;
            }
            examined += 1;

            for threshold in thresholds {
                let (n_left, pos_left) = self.left_counts(indices, feature_idx, threshold);
                let n_right = indices.len() - n_left;
                if n_left < self.config.min_samples_leaf || n_right < self.config.min_samples_leaf {
                    continue;
                }

                let gain = parent
                    - gini_weighted(n_left, pos_left)
                    - gini_weighted(n_right, positives - pos_left);
                let candidate = SplitCandidate::new(feature_idx, threshold, gain);

                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Distinct values of a feature within the node, minus the largest
    /// (splitting there would leave the right side empty)
    fn candidate_thresholds(&self, indices: &[usize], feature_idx: usize) -> Vec<i64> {
        let values: BTreeSet<i64> = indices
            .iter()
            .map(|&idx| self.features[idx][feature_idx])
            .collect();

        let mut thresholds: Vec<i64> = values.into_iter().collect();
        thresholds.pop();
        thresholds
    }

    fn left_counts(&self, indices: &[usize], feature_idx: usize, threshold: i64) -> (usize, usize) {
        indices
            .iter()
            .filter(|&&idx| self.features[idx][feature_idx] <= threshold)
            .fold((0, 0), |(n, pos), &idx| (n + 1, pos + usize::from(self.labels[idx])))
    }

    /// Split samples based on threshold
    fn split_samples(&self, indices: &[usize], feature_idx: usize, threshold: i64) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .partition(|&&idx| self.features[idx][feature_idx] <= threshold)
    }

    fn count_positive(&self, indices: &[usize]) -> usize {
        indices.iter().filter(|&&idx| self.labels[idx]).count()
    }

    /// Share of positive rows at SCALE
    fn leaf_probability(&self, n: usize, positives: usize) -> i64 {
        if n == 0 {
            return 0;
        }
        ((positives as i128 * SCALE as i128) / n as i128) as i64
    }
}

/// `n * gini(node)` at SCALE, i.e. `(n² - p² - q²) / n`
fn gini_weighted(n: usize, positives: usize) -> i128 {
    if n == 0 {
        return 0;
    }
    let n = n as i128;
    let p = positives as i128;
    let q = n - p;
    ((n * n - p * p - q * q) * SCALE as i128) / n
}
