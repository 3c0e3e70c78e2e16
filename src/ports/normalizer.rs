//! Normalizer port: pre-fitted feature scaling.

use super::ModelError;

/// A deterministic, pre-fitted transform applied to a single feature row.
///
/// Implementations never fit at inference time.
pub trait Normalizer: Send + Sync {
    /// Number of features the transform was fitted on.
    fn n_features(&self) -> usize;

    /// Names of the fitted features, in input order.
    fn feature_names(&self) -> &[String];

    /// Transform one row, producing a row of the same length.
    ///
    /// # Errors
    /// Returns `ModelError::DimensionMismatch` if `row` has the wrong length.
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError>;
}
