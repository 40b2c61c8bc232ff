//! Model Context
//!
//! Schema, optional normalizer and classifier, loaded once at startup and
//! shared read-only by every request. Widths are checked when the context
//! is built, so a request never sees a mismatched set of artifacts.

use std::path::Path;

use serde::Serialize;

use super::classifier::{predict_labels, Classifier, Label};
use super::forest::RandomForest;
use super::inference::OnnxClassifier;
use super::normalizer::Normalizer;
use crate::constants;
use crate::error::{ArtifactError, ClassifierError};
use crate::logic::artifacts::ArtifactStore;
use crate::logic::features::{FeatureSchema, FeatureVector, LayoutInfo};

// ============================================================================
// DEPLOYMENT CONFIG
// ============================================================================

/// Classifier artifact encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierFormat {
    Onnx,
    ForestJson,
}

impl ClassifierFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "onnx" => Some(Self::Onnx),
            "forest-json" | "forest_json" | "json" => Some(Self::ForestJson),
            _ => None,
        }
    }

    /// Guess from a file name; anything that is not `.json` is treated as ONNX
    pub fn from_file_name(name: &str) -> Self {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::ForestJson,
            _ => Self::Onnx,
        }
    }
}

/// Which artifacts make up a deployment
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    pub artifact_base_url: Option<String>,
    pub artifact_dir: std::path::PathBuf,
    pub classifier_file: String,
    pub classifier_format: ClassifierFormat,
    pub schema_file: String,
    pub normalizer_file: Option<String>,
}

impl DeploymentConfig {
    pub fn from_env() -> Self {
        let classifier_file = constants::get_classifier_file();
        let classifier_format = match constants::get_classifier_format() {
            Some(raw) => ClassifierFormat::parse(&raw).unwrap_or_else(|| {
                log::warn!("Unknown CLASSIFIER_FORMAT '{}', inferring from file name", raw);
                ClassifierFormat::from_file_name(&classifier_file)
            }),
            None => ClassifierFormat::from_file_name(&classifier_file),
        };

        Self {
            artifact_base_url: constants::get_artifact_base_url(),
            artifact_dir: constants::get_artifact_dir(),
            classifier_file,
            classifier_format,
            schema_file: constants::get_schema_file(),
            normalizer_file: constants::get_normalizer_file(),
        }
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(self.artifact_base_url.clone(), &self.artifact_dir)
    }
}

// ============================================================================
// MODEL CONTEXT
// ============================================================================

/// Everything a request needs from the trained model
pub struct ModelContext {
    schema: FeatureSchema,
    normalizer: Option<Normalizer>,
    classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("schema", &self.schema)
            .field("normalizer", &self.normalizer.as_ref().map(Normalizer::kind))
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl ModelContext {
    /// Assemble a context, rejecting artifacts whose widths disagree
    pub fn new(
        schema: FeatureSchema,
        normalizer: Option<Normalizer>,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ArtifactError> {
        if let Some(norm) = &normalizer {
            if norm.width() != schema.len() {
                return Err(ArtifactError::Incompatible(format!(
                    "normalizer covers {} columns, schema has {}",
                    norm.width(),
                    schema.len()
                )));
            }
        }
        if let Some(n) = classifier.n_features() {
            if n != schema.len() {
                return Err(ArtifactError::Incompatible(format!(
                    "classifier expects {} features, schema has {}",
                    n,
                    schema.len()
                )));
            }
        }

        Ok(Self {
            schema,
            normalizer,
            classifier,
        })
    }

    /// Fetch (if needed) and load every artifact the deployment names
    pub fn load(config: &DeploymentConfig) -> Result<Self, ArtifactError> {
        let store = config.store();

        let schema = FeatureSchema::from_json_slice(&store.read(&config.schema_file)?)?;
        log::info!(
            "Feature schema loaded: {} features ({:?}, layout {:08x})",
            schema.len(),
            schema.variant(),
            schema.hash()
        );

        let normalizer = match &config.normalizer_file {
            Some(name) => {
                let norm = Normalizer::from_json_slice(&store.read(name)?)?;
                log::info!("Normalizer loaded: {} ({} columns)", norm.kind(), norm.width());
                Some(norm)
            }
            None => None,
        };

        let classifier: Box<dyn Classifier> = match config.classifier_format {
            ClassifierFormat::Onnx => {
                let path = store.ensure_local(&config.classifier_file)?;
                Box::new(OnnxClassifier::from_file(&path)?)
            }
            ClassifierFormat::ForestJson => {
                let forest = RandomForest::from_json_slice(&store.read(&config.classifier_file)?)?;
                log::info!("Forest loaded: {} trees, classes {:?}", forest.n_trees(), forest.classes());
                Box::new(forest)
            }
        };

        let ctx = Self::new(schema, normalizer, classifier)?;
        log::info!(
            "Model context ready (classifier: {}, scaled: {})",
            ctx.classifier_name(),
            ctx.is_scaled()
        );
        Ok(ctx)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn normalizer(&self) -> Option<&Normalizer> {
        self.normalizer.as_ref()
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn is_scaled(&self) -> bool {
        self.normalizer.is_some()
    }

    pub fn layout_info(&self) -> LayoutInfo {
        self.schema.layout_info()
    }

    /// Apply the normalizer when this deployment has one
    pub fn scale(&self, vector: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
        vector.validate(&self.schema)?;
        match &self.normalizer {
            Some(norm) => norm.transform(vector.as_slice()),
            None => Ok(vector.as_slice().to_vec()),
        }
    }

    /// Predict already-scaled rows
    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Label>, ClassifierError> {
        predict_labels(self.classifier.as_ref(), self.schema.len(), rows)
    }

    /// Scale and predict a batch of vectors
    pub fn predict(&self, vectors: &[FeatureVector]) -> Result<Vec<Label>, ClassifierError> {
        let rows = vectors
            .iter()
            .map(|v| self.scale(v))
            .collect::<Result<Vec<_>, _>>()?;
        self.predict_rows(&rows)
    }
}

/// Context summary for the model-info endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub classifier: String,
    pub scaled: bool,
    pub normalizer: Option<&'static str>,
    pub layout: LayoutInfo,
}

impl From<&ModelContext> for ModelSummary {
    fn from(ctx: &ModelContext) -> Self {
        Self {
            classifier: ctx.classifier_name().to_string(),
            scaled: ctx.is_scaled(),
            normalizer: ctx.normalizer().map(Normalizer::kind),
            layout: ctx.layout_info(),
        }
    }
}
