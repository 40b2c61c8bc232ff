//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden through the environment.

use std::path::PathBuf;

/// Default account-info endpoint
pub const DEFAULT_ACCOUNT_API_URL: &str = "https://piloterr.com/api/v2/instagram/user/info";

/// Default account lookup timeout (seconds)
pub const DEFAULT_ACCOUNT_API_TIMEOUT: u64 = 30;

/// Default artifact file names
pub const DEFAULT_CLASSIFIER_FILE: &str = "random_forest_model.onnx";
pub const DEFAULT_SCHEMA_FILE: &str = "features.json";

/// Name of the column appended to batch output
pub const PREDICT_COLUMN: &str = "predict";

/// Upper bound for operator-entered counters
pub const MAX_COUNTER_VALUE: u32 = 10_000;

/// App name
pub const APP_NAME: &str = "Instacheck";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Base URL of the artifact store; unset means local files only
pub fn get_artifact_base_url() -> Option<String> {
    non_empty_var("ARTIFACT_BASE_URL")
}

/// Local artifact cache directory
pub fn get_artifact_dir() -> PathBuf {
    non_empty_var("ARTIFACT_DIR").map(PathBuf::from).unwrap_or_else(|| {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("instacheck")
            .join("artifacts")
    })
}

pub fn get_classifier_file() -> String {
    non_empty_var("CLASSIFIER_FILE").unwrap_or_else(|| DEFAULT_CLASSIFIER_FILE.to_string())
}

/// `onnx` or `forest-json`; defaults from the classifier file extension
pub fn get_classifier_format() -> Option<String> {
    non_empty_var("CLASSIFIER_FORMAT")
}

pub fn get_schema_file() -> String {
    non_empty_var("SCHEMA_FILE").unwrap_or_else(|| DEFAULT_SCHEMA_FILE.to_string())
}

/// Normalizer artifact; unset means this deployment feeds raw vectors
pub fn get_normalizer_file() -> Option<String> {
    non_empty_var("NORMALIZER_FILE")
}

pub fn get_account_api_url() -> String {
    non_empty_var("ACCOUNT_API_URL").unwrap_or_else(|| DEFAULT_ACCOUNT_API_URL.to_string())
}

pub fn get_account_api_key() -> Option<String> {
    non_empty_var("ACCOUNT_API_KEY")
}

pub fn get_account_api_timeout() -> u64 {
    non_empty_var("ACCOUNT_API_TIMEOUT_SECS")
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_ACCOUNT_API_TIMEOUT)
}
