//! Feature Vector - Classifier input
//!
//! **Schema-bound feature vector**
//!
//! Values are stored in schema order together with the layout hash of the
//! schema that produced them. Vectors are built once per request and only
//! read afterwards.

use serde::{Deserialize, Serialize};

use super::layout::FeatureSchema;
use crate::error::ClassifierError;

/// Ordered feature values plus the layout hash they were built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// CRC32 hash of the schema layout
    layout_hash: u32,
    /// Feature values in schema order
    values: Vec<f64>,
}

impl FeatureVector {
    /// Create from raw values, checking width against the schema
    pub fn from_values(schema: &FeatureSchema, values: Vec<f64>) -> Result<Self, ClassifierError> {
        if values.len() != schema.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: schema.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            layout_hash: schema.hash(),
            values,
        })
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        schema.index_of(name).and_then(|i| self.get(i))
    }

    /// Check that this vector belongs to `schema`
    pub fn validate(&self, schema: &FeatureSchema) -> Result<(), ClassifierError> {
        if self.layout_hash != schema.hash() {
            return Err(ClassifierError::LayoutMismatch {
                expected: schema.hash(),
                actual: self.layout_hash,
            });
        }
        if self.values.len() != schema.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: schema.len(),
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// (name, value) pairs in schema order
    pub fn named<'a>(&'a self, schema: &'a FeatureSchema) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        schema.iter().zip(self.values.iter().copied())
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self, schema: &FeatureSchema) -> serde_json::Value {
        serde_json::json!({
            "layout_hash": format!("{:08x}", self.layout_hash),
            "values": self.values,
            "named_values": self.named(schema)
                .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
                .collect::<serde_json::Map<_, _>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_checks_width() {
        let schema = FeatureSchema::account_counts();
        assert!(FeatureVector::from_values(&schema, vec![0.0; 10]).is_ok());
        let err = FeatureVector::from_values(&schema, vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, ClassifierError::ShapeMismatch { expected: 10, actual: 3 }));
    }

    #[test]
    fn test_validate_rejects_other_schema() {
        let counts = FeatureSchema::account_counts();
        let vector = FeatureVector::from_values(&counts, vec![1.0; 10]).unwrap();
        assert!(vector.validate(&counts).is_ok());

        let shuffled = FeatureSchema::new(counts.names().iter().rev().cloned()).unwrap();
        assert!(matches!(
            vector.validate(&shuffled),
            Err(ClassifierError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_get_by_name() {
        let schema = FeatureSchema::account_counts();
        let values = (0..10).map(|i| i as f64).collect();
        let vector = FeatureVector::from_values(&schema, values).unwrap();
        assert_eq!(vector.get_by_name(&schema, "Posts"), Some(3.0));
        assert_eq!(vector.get_by_name(&schema, "nonexistent"), None);
    }

    #[test]
    fn test_to_log_entry() {
        let schema = FeatureSchema::new(["a", "b"]).unwrap();
        let vector = FeatureVector::from_values(&schema, vec![1.5, 2.0]).unwrap();
        let log = vector.to_log_entry(&schema);
        assert_eq!(log["named_values"]["a"], 1.5);
        assert_eq!(log["values"][1], 2.0);
    }
}
