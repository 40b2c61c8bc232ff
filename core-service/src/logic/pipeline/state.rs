//! Request State Machine
//!
//! `Idle → RecordReceived → FeaturesAssembled → [Scaled] → Predicted → Presented`
//!
//! Strictly forward. `Scaled` is visited exactly when the deployment has a
//! normalizer. Any failure moves to the terminal `Failed` stage; a failed
//! request is never resumed, the caller starts a new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    RecordReceived,
    FeaturesAssembled,
    Scaled,
    Predicted,
    Presented,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::RecordReceived => "record_received",
            Stage::FeaturesAssembled => "features_assembled",
            Stage::Scaled => "scaled",
            Stage::Predicted => "predicted",
            Stage::Presented => "presented",
            Stage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Presented | Stage::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One visited stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEntry {
    pub stage: Stage,
    pub at: DateTime<Utc>,
}

/// Per-request progress; never shared between requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestState {
    pub id: Uuid,
    scaled: bool,
    stage: Stage,
    history: Vec<StageEntry>,
    failure: Option<String>,
}

impl RequestState {
    /// Fresh request in `Idle`; `scaled` says whether `Scaled` is on the path
    pub fn new(scaled: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            scaled,
            stage: Stage::Idle,
            history: vec![StageEntry {
                stage: Stage::Idle,
                at: Utc::now(),
            }],
            failure: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn history(&self) -> &[StageEntry] {
        &self.history
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.history.iter().map(|e| e.stage).collect()
    }

    /// Human-readable cause once `Failed`
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Stage that must follow the current one on the success path
    fn next_stage(&self) -> Option<Stage> {
        match self.stage {
            Stage::Idle => Some(Stage::RecordReceived),
            Stage::RecordReceived => Some(Stage::FeaturesAssembled),
            Stage::FeaturesAssembled if self.scaled => Some(Stage::Scaled),
            Stage::FeaturesAssembled | Stage::Scaled => Some(Stage::Predicted),
            Stage::Predicted => Some(Stage::Presented),
            Stage::Presented | Stage::Failed => None,
        }
    }

    /// Move one step forward on the success path
    pub fn advance(&mut self, to: Stage) -> Result<(), PipelineError> {
        if self.next_stage() != Some(to) {
            return Err(PipelineError::InvalidTransition {
                from: self.stage.to_string(),
                to: to.to_string(),
            });
        }
        log::debug!("[{}] {} -> {}", self.id, self.stage, to);
        self.enter(to);
        Ok(())
    }

    /// Terminal failure with a cause; a no-op once already terminal
    pub fn fail(&mut self, cause: impl Into<String>) {
        if self.stage.is_terminal() {
            return;
        }
        let cause = cause.into();
        log::warn!("[{}] failed at {}: {}", self.id, self.stage, cause);
        self.failure = Some(cause);
        self.enter(Stage::Failed);
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.history.push(StageEntry { stage, at: Utc::now() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscaled_path() {
        let mut state = RequestState::new(false);
        for stage in [Stage::RecordReceived, Stage::FeaturesAssembled, Stage::Predicted, Stage::Presented] {
            state.advance(stage).unwrap();
        }
        assert_eq!(
            state.stages(),
            vec![Stage::Idle, Stage::RecordReceived, Stage::FeaturesAssembled, Stage::Predicted, Stage::Presented]
        );
    }

    #[test]
    fn test_scaled_stage_is_required_when_scaled() {
        let mut state = RequestState::new(true);
        state.advance(Stage::RecordReceived).unwrap();
        state.advance(Stage::FeaturesAssembled).unwrap();
        assert!(state.advance(Stage::Predicted).is_err());
        state.advance(Stage::Scaled).unwrap();
        state.advance(Stage::Predicted).unwrap();
    }

    #[test]
    fn test_scaled_stage_is_rejected_when_unscaled() {
        let mut state = RequestState::new(false);
        state.advance(Stage::RecordReceived).unwrap();
        state.advance(Stage::FeaturesAssembled).unwrap();
        assert!(matches!(
            state.advance(Stage::Scaled),
            Err(PipelineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_no_backward_moves() {
        let mut state = RequestState::new(false);
        state.advance(Stage::RecordReceived).unwrap();
        assert!(state.advance(Stage::Idle).is_err());
        assert!(state.advance(Stage::RecordReceived).is_err());
        assert_eq!(state.stage(), Stage::RecordReceived);
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut state = RequestState::new(false);
        state.advance(Stage::RecordReceived).unwrap();
        state.fail("missing columns");
        assert_eq!(state.stage(), Stage::Failed);
        assert_eq!(state.failure(), Some("missing columns"));

        assert!(state.advance(Stage::FeaturesAssembled).is_err());
        state.fail("again");
        assert_eq!(state.failure(), Some("missing columns"));
        assert_eq!(state.history().len(), 3);
    }

    #[test]
    fn test_requests_are_independent() {
        assert_ne!(RequestState::new(false).id, RequestState::new(false).id);
    }
}
