//! Logic Module - Pipeline building blocks
//!
//! - `features/` - schema, derived features, record assembly
//! - `model/` - classifier backends, normalizer, shared context
//! - `account/` - profile link parsing and account-info client
//! - `batch/` - uploaded tables and column validation
//! - `pipeline/` - per-request state machine and runner

pub mod account;
pub mod artifacts;
pub mod batch;
pub mod features;
pub mod model;
pub mod pipeline;
