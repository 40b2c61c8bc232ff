//! Inference Engine - ONNX Runtime Integration
//!
//! Runs a forest converted to ONNX. The converted graph takes a float32
//! `[rows, features]` tensor and emits an int64 label tensor (plus
//! probabilities, which are ignored here).

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;

use super::classifier::Classifier;
use crate::error::{ArtifactError, ClassifierError};

/// ONNX-backed classifier
pub struct OnnxClassifier {
    /// `Session::run` needs `&mut`; the lock only serializes calls into the runtime
    session: Mutex<Session>,
    label_output: String,
    n_features: Option<usize>,
}

impl OnnxClassifier {
    /// Load ONNX model from file
    pub fn from_file(model_path: &Path) -> Result<Self, ArtifactError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(ArtifactError::NotFound {
                name: model_path.display().to_string(),
            });
        }

        let session = Session::builder()
            .map_err(|e| onnx_error(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| onnx_error(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| onnx_error(format!("Failed to load model: {}", e)))?;

        Self::from_session(session)
    }

    fn from_session(session: Session) -> Result<Self, ArtifactError> {
        let output_names: Vec<&str> = session.outputs().iter().map(|o| o.name()).collect();
        let label_output = pick_label_output(&output_names)
            .ok_or_else(|| onnx_error("No output defined".to_string()))?;

        let n_features = session
            .inputs()
            .first()
            .and_then(|input| input.dtype().tensor_shape())
            .and_then(|shape| feature_width(shape));

        log::info!(
            "ONNX model loaded successfully (label output '{}', width {:?})",
            label_output,
            n_features
        );

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            n_features,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "random-forest (onnx)"
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict_raw(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ClassifierError> {
        let width = rows.first().map_or(0, Vec::len);
        let input_data: Vec<f32> = rows.iter().flat_map(|r| r.iter().map(|v| *v as f32)).collect();

        let input_array = Array2::<f32>::from_shape_vec((rows.len(), width), input_data)
            .map_err(|e| ClassifierError::Backend(format!("Array error: {}", e)))?;

        let input_tensor = Tensor::from_array(input_array)
            .map_err(|e| ClassifierError::Backend(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ClassifierError::Backend(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.label_output)
            .ok_or_else(|| ClassifierError::Backend("No label output".to_string()))?;

        let labels = output
            .try_extract_tensor::<i64>()
            .map_err(|e| ClassifierError::Backend(format!("Extract error: {}", e)))?;

        Ok(labels.1.to_vec())
    }
}

/// Converted forests name the label output `label` or `output_label`
fn pick_label_output(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find(|n| n.to_lowercase().contains("label"))
        .or_else(|| names.first())
        .map(|n| n.to_string())
}

/// Row width from a `[rows, features]` input shape; dynamic axes are `-1`
fn feature_width(dims: &[i64]) -> Option<usize> {
    match dims {
        [_, width] if *width > 0 => Some(*width as usize),
        _ => None,
    }
}

fn onnx_error(message: String) -> ArtifactError {
    ArtifactError::Parse {
        name: "onnx model".to_string(),
        message,
    }
}
