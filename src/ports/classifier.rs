//! Classifier port: probability output of a pre-trained binary model.

use super::ModelError;

/// A pre-trained probabilistic classifier.
pub trait Classifier: Send + Sync {
    /// Number of features the model was trained on.
    fn n_features(&self) -> usize;

    /// Names of the training features, in input order.
    fn feature_names(&self) -> &[String];

    /// Class probabilities for one normalized row, indexed by class.
    ///
    /// For a binary model this is `[p_negative, p_positive]`.
    ///
    /// # Errors
    /// Returns `ModelError` if the row does not fit the model.
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError>;
}
