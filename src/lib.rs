//! # RenalGuard
//!
//! Renal tubular acidosis risk prediction for patients with primary
//! Sjögren's syndrome.
//!
//! A clinician enters six laboratory values; the crate derives a fixed-order
//! feature vector, normalizes it with a pre-fitted scaler, scores it with a
//! pre-trained gradient-boosted tree ensemble and thresholds the
//! positive-class probability at 0.5.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core clinical types (lab panel, feature vector, grade)
//! - `ports`: Trait definitions for the classifier and normalizer
//! - `adapters`: Artifact formats, model loading, log sanitization
//! - `application`: Model registry and inference pipeline
//! - `config`: Environment configuration
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use adapters::LoadError;
pub use application::{InferencePipeline, ModelRegistry};
pub use domain::{Grade, LabPanel, PredictionResult, ValidationError};

/// Result type for RenalGuard predictions
pub type Result<T> = std::result::Result<T, PredictionError>;

/// Why a prediction was not produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    /// The submitted panel was rejected. No inference was attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Inference failed: {0}")]
    Inference(String),

    /// The model artifacts failed to load at startup.
    #[error("Model unavailable: {0}")]
    Unavailable(#[from] LoadError),
}
