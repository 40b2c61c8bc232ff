//! Normalizer - fitted per-column affine transform
//!
//! `scaled[i] = (x[i] - offset[i]) / scale[i]`
//!
//! Loaded from the training artifact, either as a standard scaler
//! (`mean`, `scale`) or a min-max scaler (`min`, `max`). Columns with zero
//! scale pass through unscaled (offset still applied). Deployments without
//! this artifact feed raw vectors to the classifier.

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, ClassifierError};

/// Parameters as they appear in the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizationParams {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, max: Vec<f64> },
}

/// Per-column affine map
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    kind: &'static str,
    offsets: Vec<f64>,
    scales: Vec<f64>,
}

impl Normalizer {
    pub fn from_params(params: NormalizationParams) -> Result<Self, ArtifactError> {
        let (kind, offsets, scales) = match params {
            NormalizationParams::Standard { mean, scale } => ("standard", mean, scale),
            NormalizationParams::MinMax { min, max } => {
                if min.len() != max.len() {
                    return Err(length_error(min.len(), max.len()));
                }
                let ranges = min.iter().zip(&max).map(|(lo, hi)| hi - lo).collect();
                ("min-max", min, ranges)
            }
        };

        if offsets.len() != scales.len() {
            return Err(length_error(offsets.len(), scales.len()));
        }
        if offsets.iter().chain(&scales).any(|v| !v.is_finite()) {
            return Err(ArtifactError::Parse {
                name: "normalizer".to_string(),
                message: "non-finite parameter".to_string(),
            });
        }

        let scales = scales.into_iter().map(|s| if s == 0.0 { 1.0 } else { s }).collect();
        Ok(Self { kind, offsets, scales })
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let params: NormalizationParams = serde_json::from_slice(bytes).map_err(|e| ArtifactError::Parse {
            name: "normalizer".to_string(),
            message: e.to_string(),
        })?;
        Self::from_params(params)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Number of columns the transform was fit on
    pub fn width(&self) -> usize {
        self.offsets.len()
    }

    /// Scale one row
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        if row.len() != self.width() {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.width(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.offsets.iter().zip(&self.scales))
            .map(|(x, (offset, scale))| (x - offset) / scale)
            .collect())
    }
}

fn length_error(a: usize, b: usize) -> ArtifactError {
    ArtifactError::Parse {
        name: "normalizer".to_string(),
        message: format!("parameter lengths differ ({} vs {})", a, b),
    }
}
