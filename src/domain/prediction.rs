//! Prediction result types.
//!
//! Represents the thresholded output of the renal tubular acidosis classifier.

use serde::{Deserialize, Serialize};

/// Positive-class probability at or above which the grade is 1.
///
/// Fixed policy; the artifacts carry no alternative cut point.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Binary risk grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    /// Lower risk of renal tubular acidosis
    Zero,
    /// Higher risk of renal tubular acidosis
    One,
}

impl Grade {
    /// Threshold a positive-class probability (inclusive at 0.5).
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability >= DECISION_THRESHOLD {
            Self::One
        } else {
            Self::Zero
        }
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Short risk description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Zero => "Lower risk",
            Self::One => "Higher risk",
        }
    }

    /// Advisory shown under the result.
    #[must_use]
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::Zero => "The prediction indicates a lower risk of renal tubular acidosis, but clinical symptoms should still be considered comprehensively.",
            Self::One => "The prediction indicates a higher risk of renal tubular acidosis; further examination is recommended.",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Grade {}", self.value())
    }
}

/// Output of one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Positive-class probability (0.0 to 1.0)
    pub probability: f64,

    /// `Grade::One` iff `probability >= DECISION_THRESHOLD`
    pub grade: Grade,
}

impl PredictionResult {
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            grade: Grade::from_probability(probability),
        }
    }

    /// Probability as a percentage with two decimals, e.g. `"42.17%"`.
    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }

    /// One-line summary, e.g. `"Grade 1, predicted probability 73.40%"`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}, predicted probability {}", self.grade, self.percent_label())
    }
}

/// A prediction together with the time it was produced. Display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub result: PredictionResult,
    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    #[must_use]
    pub fn new(result: PredictionResult) -> Self {
        Self {
            result,
            assessed_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(PredictionResult::new(0.5).grade, Grade::One);
        assert_eq!(Grade::from_probability(0.5), Grade::One);
    }

    #[test]
    fn test_grade_boundaries() {
        let just_below = f64::from_bits(0.5_f64.to_bits() - 1);
        assert_eq!(Grade::from_probability(just_below), Grade::Zero);
        assert_eq!(Grade::from_probability(0.0), Grade::Zero);
        assert_eq!(Grade::from_probability(1.0), Grade::One);
        assert_eq!(Grade::from_probability(0.73), Grade::One);
    }

    #[test]
    fn test_grade_consistency_over_range() {
        for i in 0..=1000 {
            let p = f64::from(i) / 1000.0;
            let r = PredictionResult::new(p);
            assert_eq!(r.grade == Grade::One, p >= 0.5, "p = {p}");
        }
    }

    #[test]
    fn test_labels() {
        let r = PredictionResult::new(0.421_68);
        assert_eq!(r.percent_label(), "42.17%");
        assert_eq!(r.grade.to_string(), "Grade 0");
        assert_eq!(r.summary(), "Grade 0, predicted probability 42.17%");

        let r = PredictionResult::new(0.734);
        assert_eq!(r.summary(), "Grade 1, predicted probability 73.40%");
    }

    #[test]
    fn test_advisory_selected_by_grade() {
        assert!(Grade::One.advisory().contains("higher risk"));
        assert!(Grade::Zero.advisory().contains("lower risk"));
        assert_ne!(Grade::One.advisory(), Grade::Zero.advisory());
    }
}
