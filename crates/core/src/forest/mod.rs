//! Deterministic random-forest scoring
//!
//! A forest is a list of binary classification trees over the reconciled
//! one-hot feature vector. Each leaf stores the share of no-show rows that
//! reached it during training, as a fixed-point integer (`SCALE = 1e6`). The
//! forest probability is the integer mean of the leaves a row lands in.
//!
//! # Model Format
//!
//! ```json
//! {
//!   "feature_count": 6,
//!   "scale": 1000000,
//!   "seed": 42,
//!   "trees": [
//!     {
//!       "nodes": [
//!         {"id":0,"left":1,"right":2,"feature_idx":0,"threshold":0,"leaf":null},
//!         {"id":1,"left":-1,"right":-1,"feature_idx":-1,"threshold":0,"leaf":250000},
//!         {"id":2,"left":-1,"right":-1,"feature_idx":-1,"threshold":0,"leaf":750000}
//!       ]
//!     }
//!   ],
//!   "version": 1
//! }
//! ```

pub mod model;
pub mod tree;

pub use model::{ForestModel, FOREST_FORMAT_VERSION, SCALE};
pub use tree::{Node, Tree};
