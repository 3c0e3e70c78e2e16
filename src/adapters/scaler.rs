//! Standard scaler adapter: z-score normalization with exported parameters.
//!
//! Reads the JSON produced when the training-side scaler is exported:
//! per-feature `mean` and `scale`, applied as `(x - mean) / scale`.

use serde::{Deserialize, Serialize};

use crate::ports::{ModelError, Normalizer};

/// Supported `format_version` of `scaler.json`.
pub const SCALER_FORMAT_VERSION: u32 = 1;

/// Scaler parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedScaler {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Pre-fitted standard scaler.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    params: ExportedScaler,
}

impl StandardScaler {
    /// Build a scaler from exported parameters after structural checks.
    ///
    /// # Errors
    /// Returns `ModelError::Malformed` if lengths disagree, a mean is not
    /// finite, or a scale is not strictly positive.
    pub fn new(params: ExportedScaler) -> Result<Self, ModelError> {
        if params.format_version != SCALER_FORMAT_VERSION {
            return Err(ModelError::Malformed(format!(
                "unsupported scaler format_version {} (expected {SCALER_FORMAT_VERSION})",
                params.format_version
            )));
        }

        let n = params.feature_names.len();
        if n == 0 {
            return Err(ModelError::Malformed("scaler has no features".into()));
        }
        if params.mean.len() != n || params.scale.len() != n {
            return Err(ModelError::Malformed(format!(
                "scaler parameter lengths (mean={}, scale={}) do not match {n} feature names",
                params.mean.len(),
                params.scale.len()
            )));
        }

        for (i, name) in params.feature_names.iter().enumerate() {
            if !params.mean[i].is_finite() {
                return Err(ModelError::Malformed(format!("mean for {name} is not finite")));
            }
            let s = params.scale[i];
            if !s.is_finite() || s <= 0.0 {
                return Err(ModelError::Malformed(format!(
                    "scale for {name} must be finite and > 0 (got {s})"
                )));
            }
        }

        Ok(Self { params })
    }

    /// Parse `scaler.json` contents.
    ///
    /// # Errors
    /// Returns `ModelError::Malformed` on invalid JSON or parameters.
    pub fn from_json_str(content: &str) -> Result<Self, ModelError> {
        let params: ExportedScaler = serde_json::from_str(content)
            .map_err(|e| ModelError::Malformed(format!("invalid scaler JSON: {e}")))?;
        Self::new(params)
    }

    #[must_use]
    pub fn format_version(&self) -> u32 {
        self.params.format_version
    }
}

impl Normalizer for StandardScaler {
    fn n_features(&self) -> usize {
        self.params.feature_names.len()
    }

    fn feature_names(&self) -> &[String] {
        &self.params.feature_names
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let n = self.n_features();
        if row.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                got: row.len(),
            });
        }

        let out: Vec<f64> = row
            .iter()
            .zip(self.params.mean.iter().zip(self.params.scale.iter()))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect();

        if out.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite { stage: "normalization" });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ExportedScaler {
        ExportedScaler {
            format_version: 1,
            feature_names: vec!["a".into(), "b".into()],
            mean: vec![1.0, 10.0],
            scale: vec![2.0, 5.0],
        }
    }

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(params()).expect("valid scaler");
        let out = scaler.transform(&[3.0, 5.0]).expect("transform");
        assert_eq!(out, vec![1.0, -1.0]);
    }

    #[test]
    fn test_transform_dimension_mismatch() {
        let scaler = StandardScaler::new(params()).expect("valid scaler");
        assert_eq!(
            scaler.transform(&[1.0, 2.0, 3.0]),
            Err(ModelError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn test_rejects_zero_scale() {
        let mut p = params();
        p.scale[1] = 0.0;
        assert!(matches!(
            StandardScaler::new(p),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let mut p = params();
        p.mean.pop();
        assert!(StandardScaler::new(p).is_err());
    }

    #[test]
    fn test_rejects_unknown_format_version() {
        let mut p = params();
        p.format_version = 2;
        assert!(StandardScaler::new(p).is_err());
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{"format_version":1,"feature_names":["x"],"mean":[0.5],"scale":[0.25]}"#;
        let scaler = StandardScaler::from_json_str(json).expect("parse");
        assert_eq!(scaler.n_features(), 1);
        assert_eq!(scaler.transform(&[1.0]).expect("transform"), vec![2.0]);

        assert!(StandardScaler::from_json_str("{not json").is_err());
    }
}
