//! Application layer: Use cases and services.
//!
//! - `registry`: loads the model artifacts once and caches the outcome
//! - `inference`: turns a lab panel into a graded prediction

mod inference;
mod registry;

pub use inference::InferencePipeline;
pub use registry::ModelRegistry;
