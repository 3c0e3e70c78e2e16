//! Model registry: compute-once cache of the artifact load outcome.

use std::sync::{Arc, OnceLock};

use crate::adapters::{ArtifactLoader, LoadError, ModelArtifacts};
use crate::PredictionError;

use super::InferencePipeline;

static GLOBAL: OnceLock<ModelRegistry> = OnceLock::new();

/// Holds the artifacts (or the load error) for the lifetime of the process.
///
/// The first `get()` runs the loader; every later call, from any thread,
/// returns the same outcome. A failed load is cached too and is not retried.
pub struct ModelRegistry {
    loader: ArtifactLoader,
    cell: OnceLock<Result<Arc<ModelArtifacts>, LoadError>>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new(loader: ArtifactLoader) -> Self {
        Self {
            loader,
            cell: OnceLock::new(),
        }
    }

    /// Process-wide registry. `loader` is only used by the first caller.
    pub fn global(loader: ArtifactLoader) -> &'static ModelRegistry {
        GLOBAL.get_or_init(|| Self::new(loader))
    }

    /// The loaded artifacts, loading them on first use.
    ///
    /// # Errors
    /// Returns the cached `LoadError` if loading failed.
    pub fn get(&self) -> Result<Arc<ModelArtifacts>, LoadError> {
        self.cell
            .get_or_init(|| {
                self.loader.load().map(Arc::new).map_err(|e| {
                    tracing::error!(
                        error = %e,
                        model_dir = %self.loader.model_dir().display(),
                        "Model artifacts unavailable; predictions are disabled"
                    );
                    e
                })
            })
            .clone()
    }

    /// Whether a load has been attempted.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// A pipeline over the cached artifacts.
    ///
    /// # Errors
    /// Returns `PredictionError::Unavailable` if the artifacts failed to load.
    pub fn pipeline(&self) -> Result<InferencePipeline, PredictionError> {
        let artifacts = self.get()?;
        Ok(InferencePipeline::new(artifacts))
    }

    #[must_use]
    pub fn loader(&self) -> &ArtifactLoader {
        &self.loader
    }
}
