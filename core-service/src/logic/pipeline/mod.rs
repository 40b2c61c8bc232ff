//! Pipeline Module - Request orchestration
//!
//! Raw record → assemble → (normalize) → classify → label, with every
//! request tracked by its own state machine.

pub mod state;
pub mod runner;

#[cfg(test)]
mod tests;

pub use state::{RequestState, Stage, StageEntry};
pub use runner::{verdict_message, BatchPrediction, NamedFeature, PredictionRequest, PredictionResult};
