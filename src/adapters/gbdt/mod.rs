//! Gradient-boosted decision tree adapter: implementation of `Classifier`.
//!
//! Reads the JSON export of a binary gradient boosting classifier. The raw
//! score is `init_score + learning_rate * Σ leaf(tree, x)` in log-odds, and
//! the positive-class probability is its logistic sigmoid.
//!
//! # Model Format
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_names": ["alt_over_esr", "albumin", "antibody_positive", "hemoglobin", "triglyceride"],
//!   "learning_rate": 0.1,
//!   "init_score": -1.2,
//!   "trees": [
//!     { "nodes": [
//!         {"split": {"feature": 0, "threshold": 0.25, "left": 1, "right": 2}},
//!         {"leaf": {"value": -0.4}},
//!         {"leaf": {"value": 0.9}}
//!     ] }
//!   ]
//! }
//! ```

mod tree;

pub use tree::{Node, Tree};

use serde::{Deserialize, Serialize};

use crate::ports::{Classifier, ModelError};

/// Supported `format_version` of `gbdt_model.json`.
pub const GBDT_FORMAT_VERSION: u32 = 1;

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedGbdt {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub learning_rate: f64,
    pub init_score: f64,
    pub trees: Vec<Tree>,
}

/// Binary gradient-boosted tree ensemble.
#[derive(Debug, Clone)]
pub struct GbdtClassifier {
    model: ExportedGbdt,
}

impl GbdtClassifier {
    /// Build a classifier from exported parameters after structural checks.
    ///
    /// # Errors
    /// Returns `ModelError::Malformed` if the ensemble is empty, a tree is
    /// malformed, or a scalar parameter is not finite.
    pub fn new(model: ExportedGbdt) -> Result<Self, ModelError> {
        if model.format_version != GBDT_FORMAT_VERSION {
            return Err(ModelError::Malformed(format!(
                "unsupported model format_version {} (expected {GBDT_FORMAT_VERSION})",
                model.format_version
            )));
        }

        let n = model.feature_names.len();
        if n == 0 {
            return Err(ModelError::Malformed("model has no features".into()));
        }
        if model.trees.is_empty() {
            return Err(ModelError::Malformed("model has no trees".into()));
        }
        if !model.learning_rate.is_finite() || model.learning_rate <= 0.0 {
            return Err(ModelError::Malformed(format!(
                "learning_rate must be finite and > 0 (got {})",
                model.learning_rate
            )));
        }
        if !model.init_score.is_finite() {
            return Err(ModelError::Malformed("init_score is not finite".into()));
        }

        for (i, tree) in model.trees.iter().enumerate() {
            tree.validate(n)
                .map_err(|e| ModelError::Malformed(format!("tree {i}: {e}")))?;
        }

        Ok(Self { model })
    }

    /// Parse `gbdt_model.json` contents.
    ///
    /// # Errors
    /// Returns `ModelError::Malformed` on invalid JSON or parameters.
    pub fn from_json_str(content: &str) -> Result<Self, ModelError> {
        let model: ExportedGbdt = serde_json::from_str(content)
            .map_err(|e| ModelError::Malformed(format!("invalid model JSON: {e}")))?;
        Self::new(model)
    }

    #[must_use]
    pub fn format_version(&self) -> u32 {
        self.model.format_version
    }

    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.model.trees.len()
    }

    /// Raw ensemble score in log-odds.
    fn decision_function(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.model.trees.iter().map(|t| t.leaf_value(row)).sum();
        self.model.init_score + self.model.learning_rate * sum
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for GbdtClassifier {
    fn n_features(&self) -> usize {
        self.model.feature_names.len()
    }

    fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let n = self.n_features();
        if row.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                got: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite { stage: "classification input" });
        }

        let raw = self.decision_function(row);
        if raw.is_nan() {
            return Err(ModelError::NonFinite { stage: "classification" });
        }

        let p = sigmoid(raw);
        tracing::trace!(raw_score = raw, trees = self.tree_count(), "GBDT evaluated");
        Ok(vec![1.0 - p, p])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(init_score: f64) -> ExportedGbdt {
        ExportedGbdt {
            format_version: 1,
            feature_names: vec!["x".into(), "y".into()],
            learning_rate: 0.5,
            init_score,
            trees: vec![
                Tree::new(vec![Node::split(0, 0.0, 1, 2), Node::leaf(-1.0), Node::leaf(1.0)]),
                Tree::new(vec![Node::split(1, 2.0, 1, 2), Node::leaf(0.5), Node::leaf(-0.5)]),
            ],
        }
    }

    #[test]
    fn test_zero_score_is_even_odds() {
        let clf = GbdtClassifier::new(model(0.0)).expect("valid model");
        // tree 1: x > 0 -> 1.0; tree 2: y <= 2 -> 0.5; raw = 0.5 * 1.5 = 0.75
        let p = clf.predict_proba(&[1.0, 1.0]).expect("predict");
        assert!((p[1] - sigmoid(0.75)).abs() < 1e-12);

        // tree 1: -1.0; tree 2: 0.5; raw = 0.25 + 0.5 * -0.5 = 0.0
        let clf = GbdtClassifier::new(model(0.25)).expect("valid model");
        let p = clf.predict_proba(&[-1.0, 0.0]).expect("predict");
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let clf = GbdtClassifier::new(model(-2.0)).expect("valid model");
        for row in [[-3.0, 5.0], [0.0, 0.0], [7.0, 2.0]] {
            let p = clf.predict_proba(&row).expect("predict");
            assert_eq!(p.len(), 2);
            assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
            assert!((0.0..=1.0).contains(&p[1]));
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let clf = GbdtClassifier::new(model(0.0)).expect("valid model");
        assert_eq!(
            clf.predict_proba(&[1.0]),
            Err(ModelError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_rejects_empty_ensemble() {
        let mut m = model(0.0);
        m.trees.clear();
        assert!(GbdtClassifier::new(m).is_err());
    }

    #[test]
    fn test_rejects_bad_tree() {
        let mut m = model(0.0);
        m.trees.push(Tree::new(vec![Node::split(5, 0.0, 1, 2), Node::leaf(0.0), Node::leaf(0.0)]));
        let err = GbdtClassifier::new(m).unwrap_err();
        assert!(err.to_string().contains("tree 2"));
    }

    #[test]
    fn test_from_json_str_roundtrip() {
        let json = serde_json::to_string(&model(0.1)).expect("serialize");
        let clf = GbdtClassifier::from_json_str(&json).expect("parse");
        assert_eq!(clf.tree_count(), 2);
        assert_eq!(clf.feature_names(), &["x".to_string(), "y".to_string()]);
    }
}
