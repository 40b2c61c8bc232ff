//! Batch Module - Uploaded tables
//!
//! Parse an uploaded CSV, check it carries every schema column, and write
//! it back out with a `predict` column appended.

pub mod table;
pub mod validate;

#[cfg(test)]
mod tests;

pub use table::BatchTable;
pub use validate::{missing_columns, validate_columns};
