//! Inference pipeline: validate, derive, normalize, classify, threshold.
//!
//! The pipeline is built over already-loaded artifacts. It never loads or
//! caches anything itself; see `ModelRegistry` for that.

use std::sync::Arc;

use crate::adapters::{GbdtClassifier, ModelArtifacts, StandardScaler};
use crate::domain::{FeatureVector, LabPanel, PredictionResult};
use crate::ports::{Classifier, ModelError, Normalizer};
use crate::PredictionError;

/// Runs one prediction per call over shared, immutable artifacts.
///
/// Calls are independent: the same panel always yields the same result.
pub struct InferencePipeline<C = GbdtClassifier, N = StandardScaler>
where
    C: Classifier,
    N: Normalizer,
{
    artifacts: Arc<ModelArtifacts<C, N>>,
}

impl<C, N> Clone for InferencePipeline<C, N>
where
    C: Classifier,
    N: Normalizer,
{
    fn clone(&self) -> Self {
        Self {
            artifacts: Arc::clone(&self.artifacts),
        }
    }
}

impl<C, N> InferencePipeline<C, N>
where
    C: Classifier,
    N: Normalizer,
{
    /// Create a pipeline over loaded artifacts.
    pub fn new(artifacts: Arc<ModelArtifacts<C, N>>) -> Self {
        Self { artifacts }
    }

    /// Predict the renal tubular acidosis grade for one lab panel.
    ///
    /// # Errors
    /// - `PredictionError::Validation` if the panel is rejected (e.g. esr = 0).
    ///   The normalizer is not called.
    /// - `PredictionError::Inference` if normalization or classification
    ///   fails or yields something other than a two-class distribution.
    pub fn predict(&self, panel: &LabPanel) -> Result<PredictionResult, PredictionError> {
        panel.validate()?;

        let features = FeatureVector::from_panel(panel);

        let normalized = self
            .artifacts
            .normalizer()
            .transform(features.as_slice())
            .map_err(inference_error)?;
        if normalized.len() != features.as_slice().len() {
            return Err(inference_error(ModelError::DimensionMismatch {
                expected: features.as_slice().len(),
                got: normalized.len(),
            }));
        }

        let proba = self
            .artifacts
            .classifier()
            .predict_proba(&normalized)
            .map_err(inference_error)?;
        let probability = positive_class_probability(&proba)?;

        let result = PredictionResult::new(probability);

        // Lab values stay out of the log; only the outcome is recorded.
        tracing::info!(
            grade = result.grade.value(),
            probability = result.probability,
            "Prediction complete"
        );

        Ok(result)
    }
}

fn positive_class_probability(proba: &[f64]) -> Result<f64, PredictionError> {
    if proba.len() != 2 {
        return Err(PredictionError::Inference(format!(
            "classifier returned {} classes, expected 2",
            proba.len()
        )));
    }

    let p = proba[1];
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(PredictionError::Inference(format!(
            "positive-class probability {p} is outside [0, 1]"
        )));
    }

    Ok(p)
}

fn inference_error(e: ModelError) -> PredictionError {
    tracing::warn!(error = %e, "Inference step failed");
    PredictionError::Inference(e.to_string())
}
