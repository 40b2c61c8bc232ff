//! Pipeline Runner
//!
//! Drives one request through assemble → (scale) → predict against the
//! shared model context. Every error is recorded on the request state and
//! returned; the context is only ever read. The request owns its state
//! from creation to presentation, results only carry the outcome.

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::state::{RequestState, Stage};
use crate::error::{ClassifierError, FetchError, PipelineError};
use crate::logic::account::AccountLookup;
use crate::logic::batch::{validate_columns, BatchTable};
use crate::logic::features::{assemble, FeatureVector, RawAccountRecord, RawSource};
use crate::logic::model::{Label, ModelContext};

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NamedFeature {
    pub name: String,
    pub value: f64,
}

/// Outcome of a single-account request
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub request_id: Uuid,
    pub label: Label,
    /// Class id as the model emits it
    pub label_value: u8,
    pub message: String,
    pub features: Vec<NamedFeature>,
    #[serde(skip)]
    pub vector: FeatureVector,
    pub record: RawAccountRecord,
    pub predicted_at: DateTime<Utc>,
}

/// Outcome of a batch request
#[derive(Debug, Clone, Serialize)]
pub struct BatchPrediction {
    pub request_id: Uuid,
    pub labels: Vec<Label>,
    pub genuine_count: usize,
    pub fake_count: usize,
    pub message: String,
    #[serde(skip)]
    pub table: BatchTable,
}

/// Verdict text for the operator
pub fn verdict_message(label: Label, subject: Option<&str>) -> String {
    let verdict = match label {
        Label::Genuine => "a genuine account",
        Label::Fake => "a fake account",
    };
    match subject {
        Some(name) if !name.is_empty() => format!("Account {} is predicted to be {}", name, verdict),
        _ => format!("The account is predicted to be {}", verdict),
    }
}

// ============================================================================
// REQUEST
// ============================================================================

/// One prediction request bound to the shared context.
///
/// A request runs once; calling a `predict_*` method again fails with
/// `InvalidTransition`. After a failure `state()` reports the cause.
pub struct PredictionRequest<'a> {
    ctx: &'a ModelContext,
    state: RequestState,
}

impl<'a> PredictionRequest<'a> {
    pub fn new(ctx: &'a ModelContext) -> Self {
        Self {
            ctx,
            state: RequestState::new(ctx.is_scaled()),
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// Hand-off to the presentation layer
    pub fn mark_presented(&mut self) -> Result<(), PipelineError> {
        self.state.advance(Stage::Presented)
    }

    /// Record the failure on the state and hand the error back
    fn failed(&mut self, err: PipelineError) -> PipelineError {
        self.state.fail(err.to_string());
        err
    }

    fn step<T>(&mut self, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
        result.map_err(|e| self.failed(e))
    }

    /// Scale (when the deployment has a normalizer) and predict
    fn classify(&mut self, vectors: &[FeatureVector]) -> Result<Vec<Label>, PipelineError> {
        let rows = vectors
            .iter()
            .map(|v| self.ctx.scale(v))
            .collect::<Result<Vec<_>, _>>()
            .map_err(PipelineError::from);
        let rows = self.step(rows)?;
        if self.ctx.is_scaled() {
            self.state.advance(Stage::Scaled)?;
        }

        let labels = self.ctx.predict_rows(&rows).map_err(PipelineError::from);
        let labels = self.step(labels)?;
        self.state.advance(Stage::Predicted)?;
        Ok(labels)
    }

    /// Single account from an already-built record
    pub fn predict_record(&mut self, record: RawAccountRecord, subject: Option<&str>) -> Result<PredictionResult, PipelineError> {
        self.state.advance(Stage::RecordReceived)?;

        let vector = assemble(&record, self.ctx.schema());
        let vector = self.step(vector)?;
        self.state.advance(Stage::FeaturesAssembled)?;
        log::debug!("[{}] features {}", self.state.id, vector.to_log_entry(self.ctx.schema()));

        let labels = self.classify(std::slice::from_ref(&vector))?;
        let label = match labels.first() {
            Some(label) => *label,
            None => {
                let err = PipelineError::from(ClassifierError::OutputLength { expected: 1, actual: 0 });
                return Err(self.failed(err));
            }
        };

        log::info!("[{}] {:?} record predicted {}", self.state.id, record.origin, label);

        let features = vector
            .named(self.ctx.schema())
            .map(|(name, value)| NamedFeature {
                name: name.to_string(),
                value,
            })
            .collect();

        Ok(PredictionResult {
            request_id: self.state.id,
            label,
            label_value: label.value(),
            message: verdict_message(label, subject),
            features,
            vector,
            record,
            predicted_at: Utc::now(),
        })
    }

    /// Outcome of the account-info lookup; an upstream error fails the request
    pub fn receive_lookup(&mut self, lookup: Result<AccountLookup, FetchError>) -> Result<AccountLookup, PipelineError> {
        let lookup = lookup.map_err(PipelineError::from);
        self.step(lookup)
    }

    /// Single account from any source kind
    pub fn predict_source(&mut self, source: &RawSource<'_>) -> Result<PredictionResult, PipelineError> {
        let subject = match source {
            RawSource::Api { profile, .. } => Some(profile.username.clone()),
            _ => None,
        };
        let record = RawAccountRecord::from_source(source);
        self.predict_record(record, subject.as_deref())
    }

    /// Every row of an uploaded table
    pub fn predict_table(&mut self, table: &BatchTable) -> Result<BatchPrediction, PipelineError> {
        self.state.advance(Stage::RecordReceived)?;

        let checked = validate_columns(table, self.ctx.schema()).map_err(PipelineError::from);
        self.step(checked)?;

        let vectors = table
            .records()
            .map(|record| assemble(&record, self.ctx.schema()))
            .collect::<Result<Vec<_>, _>>();
        let vectors = self.step(vectors)?;
        self.state.advance(Stage::FeaturesAssembled)?;

        let labels = self.classify(&vectors)?;
        let output = table.with_predictions(&labels);
        let output = self.step(output)?;

        let fake_count = labels.iter().filter(|l| **l == Label::Fake).count();
        let genuine_count = labels.len() - fake_count;
        log::info!(
            "[{}] batch of {} rows predicted ({} genuine, {} fake)",
            self.state.id,
            labels.len(),
            genuine_count,
            fake_count
        );

        Ok(BatchPrediction {
            request_id: self.state.id,
            message: format!("Prediction completed for {} accounts", labels.len()),
            labels,
            genuine_count,
            fake_count,
            table: output,
        })
    }

    /// Parse an uploaded table and predict every row
    pub fn predict_csv<R: Read>(&mut self, body: R) -> Result<BatchPrediction, PipelineError> {
        let table = BatchTable::from_csv_reader(body);
        let table = self.step(table)?;
        self.predict_table(&table)
    }
}
