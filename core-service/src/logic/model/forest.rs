//! Native Random Forest inference.
//!
//! Loads a forest exported from sklearn as JSON (one set of `tree_` arrays
//! per estimator) and predicts in pure Rust. Inference only; training
//! happens elsewhere.
//!
//! # Artifact format
//!
//! ```text
//! {
//!   "n_features": 10,
//!   "classes": [0, 1],
//!   "trees": [
//!     { "children_left": [...], "children_right": [...],
//!       "feature": [...], "threshold": [...], "value": [[n0, n1], ...] }
//!   ]
//! }
//! ```
//!
//! Prediction averages the per-tree class distributions and takes the
//! first maximum, which is how sklearn's forest `predict` decides.

use serde::Deserialize;

use super::classifier::Classifier;
use crate::error::{ArtifactError, ClassifierError};

const LEAF: i64 = -1;

/// A node in a decision tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Feature index to split on (unused for leaves).
    pub feature: usize,
    /// Split threshold (features <= threshold go left).
    pub threshold: f64,
    /// Children, `None` for leaves.
    pub children: Option<(usize, usize)>,
    /// Normalized class distribution at this node.
    pub distribution: Vec<f64>,
}

/// A single decision tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Class distribution of the leaf reached by `row`.
    ///
    /// Inputs are compared as `f32`, matching how the forest was fit.
    pub fn leaf_distribution(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            match node.children {
                None => return &node.distribution,
                Some((left, right)) => {
                    let value = row.get(node.feature).copied().unwrap_or(0.0) as f32 as f64;
                    idx = if value <= node.threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TreeArrays {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ForestArtifact {
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<TreeArrays>,
}

/// Random forest classifier
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    classes: Vec<i64>,
}

impl RandomForest {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: ForestArtifact = serde_json::from_slice(bytes).map_err(|e| parse_error(e.to_string()))?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ForestArtifact) -> Result<Self, ArtifactError> {
        if artifact.trees.is_empty() {
            return Err(parse_error("empty forest".to_string()));
        }
        if artifact.classes.is_empty() {
            return Err(parse_error("no classes".to_string()));
        }

        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, arrays)| {
                build_tree(arrays, artifact.n_features, artifact.classes.len())
                    .map_err(|message| parse_error(format!("tree {}: {}", i, message)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            n_features: artifact.n_features,
            classes: artifact.classes,
        })
    }

    /// Mean class distribution over all trees
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.leaf_distribution(row)) {
                *total += p;
            }
        }
        let n = self.trees.len() as f64;
        totals.iter_mut().for_each(|t| *t /= n);
        totals
    }

    /// Class id with the highest mean probability (first on ties)
    pub fn predict(&self, row: &[f64]) -> i64 {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random-forest (native)"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict_raw(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ClassifierError> {
        Ok(rows.iter().map(|row| self.predict(row)).collect())
    }
}

fn parse_error(message: String) -> ArtifactError {
    ArtifactError::Parse {
        name: "forest".to_string(),
        message,
    }
}

/// Validate the parallel arrays and convert them to nodes.
///
/// Children must point forward in the array, so traversal always
/// terminates at a leaf.
fn build_tree(arrays: TreeArrays, n_features: usize, n_classes: usize) -> Result<DecisionTree, String> {
    let n = arrays.children_left.len();
    if n == 0 {
        return Err("no nodes".to_string());
    }
    if arrays.children_right.len() != n
        || arrays.feature.len() != n
        || arrays.threshold.len() != n
        || arrays.value.len() != n
    {
        return Err("inconsistent array lengths".to_string());
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let (left, right) = (arrays.children_left[i], arrays.children_right[i]);
        let values = &arrays.value[i];
        if values.len() != n_classes {
            return Err(format!("node {} has {} class values, expected {}", i, values.len(), n_classes));
        }

        let children = if left == LEAF && right == LEAF {
            None
        } else {
            let in_range = |c: i64| c > i as i64 && (c as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(format!("node {} has invalid children ({}, {})", i, left, right));
            }
            Some((left as usize, right as usize))
        };

        let feature = if children.is_some() {
            let f = arrays.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {} splits on feature {} of {}", i, f, n_features));
            }
            f as usize
        } else {
            0
        };

        let sum: f64 = values.iter().sum();
        let distribution = if sum > 0.0 {
            values.iter().map(|v| v / sum).collect()
        } else {
            values.clone()
        };

        nodes.push(TreeNode {
            feature,
            threshold: arrays.threshold[i],
            children,
            distribution,
        });
    }

    Ok(DecisionTree { nodes })
}
