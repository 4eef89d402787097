//! Classification tree structures for forest scoring
//!
//! Leaves hold the positive-class (absent) fraction of the training rows that
//! reached them, as a fixed-point integer at `SCALE` precision.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the reconciled feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` holds the fixed-point probability of the positive class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Node {
    /// Node ID (for reference, not used in traversal)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Rows with `feature <= threshold` go left
    pub threshold: i64,

    /// Positive-class probability at SCALE (Some for leaves)
    pub leaf: Option<i64>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: i64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, probability: i64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0,
            leaf: Some(probability),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single classification tree; node 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk from the root to a leaf and return its fixed-point probability.
    ///
    /// Assumes a validated tree; malformed links evaluate to 0.
    pub fn evaluate(&self, features: &[i64]) -> i64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0;
            };

            if node.is_leaf() {
                return node.leaf.unwrap_or(0);
            }

            let Some(&value) = features.get(node.feature_idx as usize) else {
                return 0;
            };

            let next = if value <= node.threshold { node.left } else { node.right };
            if next < 0 {
                return 0;
            }
            idx = next as usize;
        }
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Validate tree structure against the forest's width and scale
    pub fn validate(&self, feature_count: usize, scale: i64) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(p) if (0..=scale).contains(&p) => {}
                    Some(p) => return Err(format!("leaf {i} probability {p} outside [0, {scale}]")),
                    None => return Err(format!("leaf node {i} has no value")),
                }
                continue;
            }

            // Children must come after their parent, which also rules out cycles
            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child <= i as i32 || child as usize >= self.nodes.len() {
                    return Err(format!("node {i} has invalid {side} child: {child}"));
                }
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= feature_count {
                return Err(format!(
                    "node {i} splits on feature {} but the forest has {feature_count}",
                    node.feature_idx
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(vec![
            Node::internal(0, 0, 0, 1, 2),
            Node::leaf(1, 250_000),
            Node::leaf(2, 900_000),
        ])
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 3, 0, 1, 2);
        assert_eq!(internal.feature_idx, 3);
        assert!(!internal.is_leaf());

        let leaf = Node::leaf(1, 500_000);
        assert_eq!(leaf.feature_idx, -1);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf, Some(500_000));
    }

    #[test]
    fn test_indicator_goes_right() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[0]), 250_000);
        assert_eq!(tree.evaluate(&[1]), 900_000);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate(1, 1_000_000).is_ok());

        // Feature index beyond the forest width
        assert!(stump().validate(0, 1_000_000).is_err());

        // Child pointing back at the root
        let cyclic = Tree::new(vec![
            Node::internal(0, 0, 0, 0, 2),
            Node::leaf(1, 100),
            Node::leaf(2, 200),
        ]);
        assert!(cyclic.validate(1, 1_000_000).is_err());

        // Probability above scale
        let overflow = Tree::new(vec![Node::leaf(0, 2_000_000)]);
        assert!(overflow.validate(1, 1_000_000).is_err());
    }
}
