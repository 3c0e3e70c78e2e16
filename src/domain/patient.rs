//! Laboratory panel entered for a primary Sjögren's syndrome patient.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw laboratory values submitted from the form.
///
/// Created per submission and dropped once the result has been produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LabPanel {
    /// Alanine aminotransferase, U/L
    pub alt: f64,

    /// Serum albumin, g/L
    pub albumin: f64,

    /// Hemoglobin, g/L
    pub hemoglobin: f64,

    /// Erythrocyte sedimentation rate, mm/h. Used as a divisor.
    pub esr: f64,

    /// Anti-synthetase antibody positive
    pub antibody_positive: bool,

    /// Triglyceride, mmol/L
    pub triglyceride: f64,
}

/// Rejected input. No prediction is attempted when this is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("esr must be nonzero")]
    ZeroEsr,

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

impl LabPanel {
    /// Check the declared minimums.
    ///
    /// Only the structural constraints are enforced: `esr` must be strictly
    /// positive and every other value must be finite and non-negative. There
    /// is no upper bound and no clinical plausibility check.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let numeric = [
            ("alt", self.alt),
            ("albumin", self.albumin),
            ("hemoglobin", self.hemoglobin),
            ("esr", self.esr),
            ("triglyceride", self.triglyceride),
        ];

        for (field, value) in numeric {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
        }

        if self.esr == 0.0 {
            return Err(ValidationError::ZeroEsr);
        }

        for (field, value) in numeric {
            if value < 0.0 {
                return Err(ValidationError::Negative { field });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> LabPanel {
        LabPanel {
            alt: 40.0,
            albumin: 35.0,
            hemoglobin: 120.0,
            esr: 20.0,
            antibody_positive: false,
            triglyceride: 1.5,
        }
    }

    #[test]
    fn test_valid_panel() {
        assert!(panel().validate().is_ok());
    }

    #[test]
    fn test_zero_values_accepted_except_esr() {
        let p = LabPanel {
            alt: 0.0,
            albumin: 0.0,
            hemoglobin: 0.0,
            triglyceride: 0.0,
            ..panel()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_zero_esr_rejected() {
        let p = LabPanel { esr: 0.0, ..panel() };
        let err = p.validate().unwrap_err();
        assert_eq!(err, ValidationError::ZeroEsr);
        assert_eq!(err.to_string(), "esr must be nonzero");

        // -0.0 compares equal to zero and divides to infinity.
        let p = LabPanel { esr: -0.0, ..panel() };
        assert_eq!(p.validate(), Err(ValidationError::ZeroEsr));
    }

    #[test]
    fn test_negative_rejected() {
        let p = LabPanel { albumin: -1.0, ..panel() };
        assert_eq!(
            p.validate(),
            Err(ValidationError::Negative { field: "albumin" })
        );

        let p = LabPanel { esr: -3.0, ..panel() };
        assert_eq!(p.validate(), Err(ValidationError::Negative { field: "esr" }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let p = LabPanel { alt: f64::NAN, ..panel() };
        assert_eq!(p.validate(), Err(ValidationError::NotFinite { field: "alt" }));

        let p = LabPanel {
            triglyceride: f64::INFINITY,
            ..panel()
        };
        assert!(matches!(
            p.validate(),
            Err(ValidationError::NotFinite { field: "triglyceride" })
        ));
    }

    #[test]
    fn test_no_upper_bound() {
        let p = LabPanel {
            alt: 5_000.0,
            hemoglobin: 900.0,
            ..panel()
        };
        assert!(p.validate().is_ok());
    }
}
