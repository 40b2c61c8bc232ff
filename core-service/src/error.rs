//! Error types
//!
//! `PipelineError` is request-scoped: it ends one prediction request and
//! leaves the shared model context untouched. `ArtifactError` only happens
//! while the context is being built at startup.

use thiserror::Error;

/// Failures of a single prediction request
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Account lookup failed or returned an unusable payload
    #[error("account lookup failed: {0}")]
    UpstreamFetch(String),

    /// Schema features that no source or derivation could produce
    #[error("cannot produce features: {}", .features.join(", "))]
    MissingFeature { features: Vec<String> },

    /// Uploaded table lacks schema columns
    #[error(transparent)]
    MissingColumns(#[from] MissingColumnsError),

    /// A value exists but is not numeric
    #[error("feature '{feature}' has non-numeric value '{value}'")]
    InvalidValue { feature: String, value: String },

    /// Uploaded table could not be parsed
    #[error("malformed table: {0}")]
    MalformedTable(String),

    /// Inference failed (shape mismatch, backend failure, unknown label)
    #[error("classifier invocation failed: {0}")]
    ClassifierInvocation(#[from] ClassifierError),

    /// Request tried to move backwards or leave a terminal stage
    #[error("invalid stage transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl PipelineError {
    /// Text shown to the operator. Internal causes stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::UpstreamFetch(_) => {
                "The link is invalid or the account is unavailable. Check the link and try again."
                    .to_string()
            }
            PipelineError::MissingFeature { features } => format!(
                "The loaded model needs features that could not be produced: {}",
                features.join(", ")
            ),
            PipelineError::MissingColumns(err) => format!(
                "File format is not valid. Missing required columns: {}",
                err.missing.join(", ")
            ),
            PipelineError::InvalidValue { feature, value } => {
                format!("Value '{}' for '{}' is not a number.", value, feature)
            }
            PipelineError::MalformedTable(_) => {
                "The uploaded file could not be read as a table. Check the file format.".to_string()
            }
            PipelineError::ClassifierInvocation(_) | PipelineError::InvalidTransition { .. } => {
                "An unexpected error occurred during prediction. Please try again.".to_string()
            }
        }
    }
}

/// Aggregate report of every schema column missing from a table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required columns: {}", .missing.join(", "))]
pub struct MissingColumnsError {
    /// Missing names, in schema order
    pub missing: Vec<String>,
}

/// Inference backend failures
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("expected {expected} features per row, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("vector was built for schema {actual:08x}, model expects {expected:08x}")]
    LayoutMismatch { expected: u32, actual: u32 },

    #[error("classifier produced unsupported label {0}")]
    UnknownLabel(i64),

    #[error("expected {expected} labels, got {actual}")]
    OutputLength { expected: usize, actual: usize },

    #[error("inference backend error: {0}")]
    Backend(String),
}

/// Account-info API failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not a profile link or username: '{0}'")]
    InvalidProfileLink(String),

    #[error("account API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed account payload: {0}")]
    MalformedPayload(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("account API key is not configured")]
    NotConfigured,
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        PipelineError::UpstreamFetch(err.to_string())
    }
}

/// Startup failures while building the model context
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact '{name}' not found locally and no artifact base URL is configured")]
    NotFound { name: String },

    #[error("failed to download artifact '{name}': {message}")]
    Download { name: String, message: String },

    #[error("failed to parse artifact '{name}': {message}")]
    Parse { name: String, message: String },

    #[error("incompatible artifacts: {0}")]
    Incompatible(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
