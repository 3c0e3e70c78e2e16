//! Model input features derived from a [`LabPanel`].
//!
//! The slot order must match the order the scaler and classifier were fitted
//! with. Reordering would not raise an error, it would silently corrupt every
//! prediction, so the order lives in one constant and both artifacts are
//! checked against it at load time.

use super::patient::LabPanel;

/// Number of model input features.
pub const FEATURE_COUNT: usize = 5;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "alt_over_esr",
    "albumin",
    "antibody_positive",
    "hemoglobin",
    "triglyceride",
];

/// Slot indices into a [`FeatureVector`].
pub mod slot {
    pub const ALT_OVER_ESR: usize = 0;
    pub const ALBUMIN: usize = 1;
    pub const ANTIBODY_POSITIVE: usize = 2;
    pub const HEMOGLOBIN: usize = 3;
    pub const TRIGLYCERIDE: usize = 4;
}

/// Fixed-order feature row consumed by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Derive the feature row from a validated panel.
    ///
    /// `esr` must be nonzero; call [`LabPanel::validate`] first.
    #[must_use]
    pub fn from_panel(panel: &LabPanel) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        values[slot::ALT_OVER_ESR] = panel.alt / panel.esr;
        values[slot::ALBUMIN] = panel.albumin;
        values[slot::ANTIBODY_POSITIVE] = if panel.antibody_positive { 1.0 } else { 0.0 };
        values[slot::HEMOGLOBIN] = panel.hemoglobin;
        values[slot::TRIGLYCERIDE] = panel.triglyceride;
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value for a named feature, if the name is known.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }
}
