//! Ports layer: Trait definitions for the model collaborators.
//!
//! The classifier and the normalizer are opaque pre-trained artifacts. These
//! traits are the only operations the inference pipeline relies on, which
//! keeps the export format an adapter concern.

mod classifier;
mod error;
mod normalizer;

pub use classifier::Classifier;
pub use error::ModelError;
pub use normalizer::Normalizer;
