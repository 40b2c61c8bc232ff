//! Classifier Wrapper
//!
//! Backends implement [`Classifier`] over a batch of rows. The wrapper
//! checks shapes before calling a backend and maps raw class ids to
//! [`Label`], rejecting anything outside {0, 1}.

use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

// ============================================================================
// LABEL
// ============================================================================

/// Binary verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Genuine,
    Fake,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Genuine => "genuine",
            Label::Fake => "fake",
        }
    }

    /// Class id the model was trained with
    pub fn value(&self) -> u8 {
        match self {
            Label::Genuine => 0,
            Label::Fake => 1,
        }
    }
}

impl TryFrom<i64> for Label {
    type Error = ClassifierError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::Genuine),
            1 => Ok(Label::Fake),
            other => Err(ClassifierError::UnknownLabel(other)),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Read-only inference backend
///
/// Implementations must be usable from many requests at once.
pub trait Classifier: Send + Sync {
    /// Backend name for status output
    fn name(&self) -> &str;

    /// Row width the model was trained on, when the artifact records it
    fn n_features(&self) -> Option<usize>;

    /// Raw class ids, one per row
    fn predict_raw(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ClassifierError>;
}

/// Run a backend over `rows`, checking widths and mapping labels
pub fn predict_labels(classifier: &dyn Classifier, width: usize, rows: &[Vec<f64>]) -> Result<Vec<Label>, ClassifierError> {
    if let Some(bad) = rows.iter().find(|r| r.len() != width) {
        return Err(ClassifierError::ShapeMismatch {
            expected: width,
            actual: bad.len(),
        });
    }
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let raw = classifier.predict_raw(rows)?;
    if raw.len() != rows.len() {
        return Err(ClassifierError::OutputLength {
            expected: rows.len(),
            actual: raw.len(),
        });
    }

    raw.into_iter().map(Label::try_from).collect()
}
