//! Batch Validator
//!
//! A table is predictable only if every schema name appears among its
//! columns. Extra columns are ignored here and carried through untouched.

use crate::error::MissingColumnsError;
use crate::logic::features::FeatureSchema;

use super::table::BatchTable;

/// Schema names absent from `table`, in schema order
pub fn missing_columns(table: &BatchTable, schema: &FeatureSchema) -> Vec<String> {
    schema
        .iter()
        .filter(|name| !table.has_column(name))
        .map(str::to_string)
        .collect()
}

pub fn validate_columns(table: &BatchTable, schema: &FeatureSchema) -> Result<(), MissingColumnsError> {
    let missing = missing_columns(table, schema);
    if missing.is_empty() {
        Ok(())
    } else {
        log::warn!("Uploaded table is missing {} required column(s): {:?}", missing.len(), missing);
        Err(MissingColumnsError { missing })
    }
}
