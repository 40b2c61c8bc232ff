//! Feature Vector Assembler
//!
//! Schema-driven: walks the loaded schema in order and resolves each name
//! against a [`RawAccountRecord`]:
//!
//! 1. direct lookup of the exact feature name in the record
//! 2. otherwise the derivation registered for that name, computed from
//!    canonical attributes
//!
//! A name that resolves through neither path is reported as missing. Every
//! missing name is collected before failing so the operator sees the full set.

use super::derived::{
    description_length, digit_ratio, fullname_word_count, name_equals_username, presence_flag, ratio,
};
use super::layout::FeatureSchema;
use super::record::{normalize_name, Attribute, FieldValue, RawAccountRecord, RawSource};
use super::vector::FeatureVector;
use crate::error::PipelineError;

// ============================================================================
// DERIVATIONS
// ============================================================================

/// How a feature is computed when it is not supplied verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Numeric value of one attribute
    Value(Attribute),
    /// `ratio(numerator, denominator)`
    Ratio(Attribute, Attribute),
    /// Character count of a text attribute
    TextLength(Attribute),
    /// Whitespace token count of a text attribute
    WordCount(Attribute),
    /// Digit share of a text attribute
    DigitRatio(Attribute),
    /// Case-insensitive full name == username
    NameEqualsUsername,
    /// 1 if the attribute is non-empty / truthy
    Presence(Attribute),
}

impl Derivation {
    /// Derivation registered for a feature name, if any
    pub fn for_feature(name: &str) -> Option<Self> {
        use Attribute::*;

        let derivation = match normalize_name(name).as_str() {
            "followers" => Derivation::Value(Followers),
            "following" | "follows" => Derivation::Value(Following),
            "posts" => Derivation::Value(Posts),
            "mutual friends" => Derivation::Value(MutualFriends),
            "threads" => Derivation::Value(Threads),
            "private" => Derivation::Value(Private),
            "following/followers" => Derivation::Ratio(Following, Followers),
            "posts/followers" => Derivation::Ratio(Posts, Followers),
            "bio" | "description length" => Derivation::TextLength(Description),
            "fullname words" => Derivation::WordCount(FullName),
            "nums/length fullname" => Derivation::DigitRatio(FullName),
            "nums/length username" => Derivation::DigitRatio(Username),
            "name==username" => Derivation::NameEqualsUsername,
            "profile picture" | "profile pic" => Derivation::Presence(Avatar),
            "external link" | "external url" => Derivation::Presence(Website),
            _ => return None,
        };
        Some(derivation)
    }

    fn compute(&self, record: &RawAccountRecord, feature: &str) -> Resolution {
        match *self {
            Derivation::Value(attr) => match record.attribute(attr) {
                Some(value) => numeric(feature, value),
                None => Resolution::Missing,
            },
            Derivation::Ratio(num, den) => {
                let (Some(n), Some(d)) = (record.attribute(num), record.attribute(den)) else {
                    return Resolution::Missing;
                };
                match (numeric(feature, n), numeric(feature, d)) {
                    (Resolution::Value(n), Resolution::Value(d)) => Resolution::Value(ratio(n, d)),
                    (Resolution::Value(_), other) | (other, _) => other,
                }
            }
            Derivation::TextLength(attr) => text(record, attr, |s| description_length(s) as f64),
            Derivation::WordCount(attr) => text(record, attr, |s| fullname_word_count(s) as f64),
            Derivation::DigitRatio(attr) => text(record, attr, digit_ratio),
            Derivation::NameEqualsUsername => {
                match (record.attribute(Attribute::FullName), record.attribute(Attribute::Username)) {
                    (Some(name), Some(username)) => Resolution::Value(
                        name_equals_username(&name.as_text(), &username.as_text()) as f64,
                    ),
                    _ => Resolution::Missing,
                }
            }
            Derivation::Presence(attr) => match record.attribute(attr) {
                Some(value) => Resolution::Value(f64::from(presence_flag(value))),
                None => Resolution::Missing,
            },
        }
    }
}

enum Resolution {
    Value(f64),
    Missing,
    Invalid { feature: String, value: String },
}

fn numeric(feature: &str, value: &FieldValue) -> Resolution {
    match value.as_number() {
        Some(n) => Resolution::Value(n),
        None => Resolution::Invalid {
            feature: feature.to_string(),
            value: value.as_text(),
        },
    }
}

fn text(record: &RawAccountRecord, attr: Attribute, f: impl Fn(&str) -> f64) -> Resolution {
    match record.attribute(attr) {
        Some(value) => Resolution::Value(f(&value.as_text())),
        None => Resolution::Missing,
    }
}

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Build the schema-ordered vector for one record
pub fn assemble(record: &RawAccountRecord, schema: &FeatureSchema) -> Result<FeatureVector, PipelineError> {
    let mut values = Vec::with_capacity(schema.len());
    let mut missing = Vec::new();

    for name in schema.iter() {
        let resolution = match record.get(name) {
            Some(value) => numeric(name, value),
            None => match Derivation::for_feature(name) {
                Some(derivation) => derivation.compute(record, name),
                None => Resolution::Missing,
            },
        };

        match resolution {
            Resolution::Value(v) => values.push(v),
            Resolution::Missing => missing.push(name.to_string()),
            Resolution::Invalid { feature, value } => {
                return Err(PipelineError::InvalidValue { feature, value });
            }
        }
    }

    if !missing.is_empty() {
        log::debug!("Record ({:?}) cannot produce {:?}", record.origin, missing);
        return Err(PipelineError::MissingFeature { features: missing });
    }

    FeatureVector::from_values(schema, values).map_err(PipelineError::from)
}

/// Convenience wrapper: normalize any source kind into a record, then assemble
pub fn assemble_source(source: &RawSource<'_>, schema: &FeatureSchema) -> Result<(RawAccountRecord, FeatureVector), PipelineError> {
    let record = RawAccountRecord::from_source(source);
    let vector = assemble(&record, schema)?;
    Ok((record, vector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::record::RecordOrigin;
    use std::collections::BTreeMap;

    #[test]
    fn test_direct_lookup_wins_over_derivation() {
        // A table with a 0/1 "Bio" column must not be replaced by a length
        let mut record = RawAccountRecord::new(RecordOrigin::TableRow);
        record.insert("Bio", "1");
        record.insert("description", "a long biography");
        let schema = FeatureSchema::new(["Bio"]).unwrap();
        let vector = assemble(&record, &schema).unwrap();
        assert_eq!(vector.as_slice(), &[1.0]);
    }

    #[test]
    fn test_derivation_through_aliases() {
        let headers: Vec<String> = ["#followers", "#follows"].iter().map(|s| s.to_string()).collect();
        let row: Vec<String> = ["200", "50"].iter().map(|s| s.to_string()).collect();
        let source = RawSource::TableRow { headers: &headers, row: &row };
        let schema = FeatureSchema::new(["Following/Followers"]).unwrap();
        let (_, vector) = assemble_source(&source, &schema).unwrap();
        assert_eq!(vector.as_slice(), &[0.25]);
    }

    #[test]
    fn test_reports_every_missing_feature() {
        let values = BTreeMap::from([("Followers".to_string(), 3.0)]);
        let record = RawAccountRecord::from_manual(&values);
        let schema = FeatureSchema::new(["Followers", "Mystery", "Posts/Followers"]).unwrap();
        match assemble(&record, &schema) {
            Err(PipelineError::MissingFeature { features }) => {
                assert_eq!(features, vec!["Mystery".to_string(), "Posts/Followers".to_string()]);
            }
            other => panic!("expected MissingFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_cell_is_invalid_value() {
        let headers = vec!["Followers".to_string()];
        let row = vec!["lots".to_string()];
        let record = RawAccountRecord::from_row(&headers, &row);
        let schema = FeatureSchema::new(["Followers"]).unwrap();
        assert!(matches!(
            assemble(&record, &schema),
            Err(PipelineError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_feature_without_column_is_missing() {
        let record = RawAccountRecord::from_manual(&BTreeMap::new());
        let schema = FeatureSchema::new(["engagement score"]).unwrap();
        assert!(matches!(
            assemble(&record, &schema),
            Err(PipelineError::MissingFeature { .. })
        ));
    }

    #[test]
    fn test_derivation_registry() {
        assert_eq!(
            Derivation::for_feature("Posts/Followers"),
            Some(Derivation::Ratio(Attribute::Posts, Attribute::Followers))
        );
        assert_eq!(Derivation::for_feature("name==username"), Some(Derivation::NameEqualsUsername));
        assert_eq!(Derivation::for_feature("#posts"), Some(Derivation::Value(Attribute::Posts)));
        assert_eq!(Derivation::for_feature("whatever"), None);
    }
}
