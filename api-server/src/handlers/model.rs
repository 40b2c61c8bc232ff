//! Model info handler

use axum::{extract::State, Json};
use instacheck_core::logic::model::ModelSummary;

use crate::AppState;

/// Loaded schema layout, classifier backend and scaling
pub async fn info(State(state): State<AppState>) -> Json<ModelSummary> {
    Json(ModelSummary::from(state.ctx.as_ref()))
}
