//! Regression tree of a boosted ensemble.

use serde::{Deserialize, Serialize};

use crate::ports::ModelError;

/// A tree node.
///
/// Serialized externally tagged: `{"split": {...}}` or `{"leaf": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Go to `left` when `x[feature] <= threshold`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Node {
    #[must_use]
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    #[must_use]
    pub fn leaf(value: f64) -> Self {
        Self::Leaf { value }
    }
}

/// Flat node array; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Structural checks run once at load.
    ///
    /// Children must point strictly forward, so traversal always terminates.
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Malformed("tree has no nodes".into()));
        }

        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(ModelError::Malformed(format!(
                            "node {i} splits on feature {feature}, model has {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::Malformed(format!(
                            "node {i} has a non-finite threshold"
                        )));
                    }
                    for child in [left, right] {
                        if child <= i || child >= len {
                            return Err(ModelError::Malformed(format!(
                                "node {i} has invalid child index {child}"
                            )));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelError::Malformed(format!(
                            "leaf {i} has a non-finite value"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Leaf value reached by `row`. The tree must have passed `validate`.
    pub(crate) fn leaf_value(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}
