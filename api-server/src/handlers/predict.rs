//! Prediction handlers
//!
//! Three ways in (account lookup, manual form, uploaded table), one
//! pipeline behind them.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use instacheck_core::logic::features::RawSource;
use instacheck_core::logic::pipeline::{BatchPrediction, PredictionRequest};
use instacheck_core::{ModelContext, PipelineError};
use validator::Validate;

use crate::models::{AccountPredictionRequest, ManualPredictionRequest, PredictionResponse};
use crate::{AppError, AppResult, AppState};

/// Look the account up, then predict with the operator's counters
pub async fn account(
    State(state): State<AppState>,
    Json(req): Json<AccountPredictionRequest>,
) -> AppResult<Json<PredictionResponse>> {
    req.validate()?;

    let mut request = PredictionRequest::new(&state.ctx);
    let lookup = state.accounts.lookup(&req.profile).await;
    let lookup = request.receive_lookup(lookup)?;

    let source = RawSource::Api {
        profile: &lookup.profile,
        counters: req.counters(),
    };
    let result = request.predict_source(&source)?;
    request.mark_presented()?;

    tracing::info!(
        request_id = %result.request_id,
        username = %lookup.username,
        label = %result.label,
        "Account prediction"
    );

    Ok(Json(PredictionResponse::new(result, request.state(), Some(lookup.profile))))
}

/// Predict from hand-entered feature values
pub async fn manual(
    State(state): State<AppState>,
    Json(req): Json<ManualPredictionRequest>,
) -> AppResult<Json<PredictionResponse>> {
    req.validate()?;

    let mut request = PredictionRequest::new(&state.ctx);
    let result = request.predict_source(&RawSource::Manual(&req.features))?;
    request.mark_presented()?;

    tracing::info!(request_id = %result.request_id, label = %result.label, "Manual prediction");

    Ok(Json(PredictionResponse::new(result, request.state(), None)))
}

/// Predict every row of an uploaded CSV and return it with a `predict` column
pub async fn batch(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let ctx = Arc::clone(&state.ctx);
    let (batch, csv) = tokio::task::spawn_blocking(move || predict_upload(&ctx, &body))
        .await
        .map_err(|e| AppError::InternalError(format!("batch task failed: {}", e)))??;

    tracing::info!(
        request_id = %batch.request_id,
        rows = batch.labels.len(),
        fake = batch.fake_count,
        "Batch prediction"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"predictions.csv\"".to_string(),
            ),
            (header::HeaderName::from_static("x-request-id"), batch.request_id.to_string()),
        ],
        csv,
    )
        .into_response())
}

fn predict_upload(ctx: &ModelContext, body: &[u8]) -> Result<(BatchPrediction, String), PipelineError> {
    let mut request = PredictionRequest::new(ctx);
    let batch = request.predict_csv(body)?;
    let csv = batch.table.to_csv_string()?;
    request.mark_presented()?;
    Ok((batch, csv))
}
