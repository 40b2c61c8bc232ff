//! Prediction request/response models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use instacheck_core::logic::account::AccountProfile;
use instacheck_core::logic::features::OperatorCounters;
use instacheck_core::constants::MAX_COUNTER_VALUE;
use instacheck_core::logic::pipeline::{NamedFeature, PredictionResult, RequestState, Stage};
use instacheck_core::Label;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Single-account lookup plus the counters the API does not expose
#[derive(Debug, Deserialize, Validate)]
pub struct AccountPredictionRequest {
    /// Profile link or bare username
    #[validate(length(min = 1, max = 512))]
    pub profile: String,

    #[validate(range(max = MAX_COUNTER_VALUE))]
    #[serde(default)]
    pub posts: u32,

    #[validate(range(max = MAX_COUNTER_VALUE))]
    #[serde(default)]
    pub mutual_friends: u32,

    #[validate(range(max = MAX_COUNTER_VALUE))]
    #[serde(default)]
    pub threads: u32,
}

impl AccountPredictionRequest {
    pub fn counters(&self) -> OperatorCounters {
        OperatorCounters {
            posts: self.posts,
            mutual_friends: self.mutual_friends,
            threads: self.threads,
        }
    }
}

/// Every feature typed in by hand
#[derive(Debug, Deserialize, Validate)]
pub struct ManualPredictionRequest {
    #[validate(length(min = 1))]
    pub features: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub request_id: Uuid,
    pub label: Label,
    pub label_value: u8,
    pub message: String,
    pub features: Vec<NamedFeature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<AccountProfile>,
    pub stages: Vec<Stage>,
    pub predicted_at: DateTime<Utc>,
}

impl PredictionResponse {
    pub fn new(result: PredictionResult, state: &RequestState, profile: Option<AccountProfile>) -> Self {
        Self {
            request_id: result.request_id,
            label: result.label,
            label_value: result.label_value,
            message: result.message,
            stages: state.stages(),
            features: result.features,
            profile,
            predicted_at: result.predicted_at,
        }
    }
}
