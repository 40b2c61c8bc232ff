//! Instacheck Core - feature-to-prediction pipeline
//!
//! Turns an Instagram account (API lookup, table row or manual form) into
//! the fixed-shape vector a pre-trained forest expects, and the forest's
//! output into a genuine/fake verdict.
//!
//! The model context is loaded once and shared read-only; everything else
//! is per request.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{ArtifactError, ClassifierError, FetchError, MissingColumnsError, PipelineError};
pub use logic::account::{AccountInfoClient, AccountProfile};
pub use logic::artifacts::ArtifactStore;
pub use logic::batch::BatchTable;
pub use logic::features::{FeatureSchema, FeatureVector, OperatorCounters, RawAccountRecord, RawSource};
pub use logic::model::{DeploymentConfig, Label, ModelContext};
pub use logic::pipeline::{PredictionRequest, PredictionResult, Stage};
