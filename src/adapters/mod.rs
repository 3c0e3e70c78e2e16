//! Adapters layer: Concrete implementations of ports.
//!
//! - `scaler`: JSON-exported standard scaler (`Normalizer`)
//! - `gbdt`: JSON-exported gradient-boosted trees (`Classifier`)
//! - `artifacts`: model directory loading and integrity checks
//! - `sanitize`: patient-data filtering for logs

pub mod artifacts;
pub mod gbdt;
pub mod sanitize;
pub mod scaler;

pub use artifacts::{ArtifactLoader, LoadError, ModelArtifacts};
pub use gbdt::GbdtClassifier;
pub use scaler::StandardScaler;
