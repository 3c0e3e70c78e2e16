//! Domain layer: Core clinical types.
//!
//! Pure Rust types with no I/O. The feature order and the decision threshold
//! are fixed here so every other layer shares one definition.

mod features;
mod patient;
mod prediction;

pub use features::{slot, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use patient::{LabPanel, ValidationError};
pub use prediction::{Assessment, Grade, PredictionResult, DECISION_THRESHOLD};
