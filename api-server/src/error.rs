//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use instacheck_core::PipelineError;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),
    InvalidInput(String),
    MissingColumns { message: String, missing: Vec<String> },

    // External service errors
    UpstreamUnavailable(String),

    // Prediction errors
    PredictionFailed(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, missing) = match &self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str(), None),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.as_str(), None),
            AppError::MissingColumns { message, missing } => {
                (StatusCode::BAD_REQUEST, message.as_str(), Some(missing))
            }
            AppError::UpstreamUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg.as_str(), None),
            AppError::PredictionFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str(), None),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16()
        });
        if let Some(missing) = missing {
            body["missing"] = json!(missing);
        }

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let message = err.user_message();
        match err {
            PipelineError::UpstreamFetch(cause) => {
                tracing::warn!("Account lookup failed: {}", cause);
                AppError::UpstreamUnavailable(message)
            }
            PipelineError::MissingColumns(err) => AppError::MissingColumns {
                message,
                missing: err.missing,
            },
            PipelineError::MissingFeature { .. }
            | PipelineError::InvalidValue { .. }
            | PipelineError::MalformedTable(_) => {
                tracing::warn!("Rejected input: {}", err);
                AppError::InvalidInput(message)
            }
            PipelineError::ClassifierInvocation(_) | PipelineError::InvalidTransition { .. } => {
                tracing::error!("Prediction failed: {}", err);
                AppError::PredictionFailed(message)
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(format!("Invalid request: {}", err))
    }
}
