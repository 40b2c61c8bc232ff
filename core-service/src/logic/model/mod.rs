//! Model Module - Classifier backends and the shared model context
//!
//! Backends are swappable behind the `Classifier` trait; the context ties
//! one backend to the schema (and normalizer) it was trained with.

pub mod classifier;
pub mod forest;
pub mod inference;
pub mod normalizer;
pub mod context;

// Re-export common types
pub use classifier::{predict_labels, Classifier, Label};
pub use forest::{DecisionTree, RandomForest};
pub use inference::OnnxClassifier;
pub use normalizer::{NormalizationParams, Normalizer};
pub use context::{ClassifierFormat, DeploymentConfig, ModelContext, ModelSummary};
