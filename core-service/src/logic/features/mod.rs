//! Features Module - Feature Extraction Engine
//!
//! Turns raw account records into schema-ordered vectors.
//! The schema decides which features exist; derivations are looked up by
//! feature name so new layouts need no code changes when they reuse names.

pub mod layout;
pub mod derived;
pub mod record;
pub mod vector;
pub mod assembler;


// Re-export common types
pub use layout::{FeatureSchema, LayoutInfo, SchemaVariant};
pub use record::{Attribute, FieldValue, OperatorCounters, RawAccountRecord, RawSource, RecordOrigin};
pub use vector::FeatureVector;
pub use assembler::{assemble, assemble_source, Derivation};
