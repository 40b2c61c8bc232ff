//! Raw Account Record
//!
//! Attribute map from one of three origins (API lookup, table row, manual
//! form). The assembler reads features out of it by direct name lookup or
//! by derivation from canonical attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::derived::Presence;
use crate::logic::account::AccountProfile;

// ============================================================================
// FIELD VALUES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl FieldValue {
    /// Numeric reading of the value, `None` for non-numeric text
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                match trimmed.to_ascii_lowercase().as_str() {
                    "true" => Some(1.0),
                    "false" => Some(0.0),
                    _ => trimmed.parse::<f64>().ok().filter(|v| v.is_finite()),
                }
            }
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }
}

/// Table cells encode flags as text, so "0" and "false" read as absent
impl Presence for FieldValue {
    fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.trim().is_empty() && self.as_number() != Some(0.0),
            other => other.as_number().map_or(false, |n| n != 0.0),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

// ============================================================================
// CANONICAL ATTRIBUTES
// ============================================================================

/// Account attributes that derivations are computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Followers,
    Following,
    Posts,
    FullName,
    Username,
    Description,
    Avatar,
    Website,
    Private,
    MutualFriends,
    Threads,
}

impl Attribute {
    pub const ALL: [Attribute; 11] = [
        Attribute::Followers,
        Attribute::Following,
        Attribute::Posts,
        Attribute::FullName,
        Attribute::Username,
        Attribute::Description,
        Attribute::Avatar,
        Attribute::Website,
        Attribute::Private,
        Attribute::MutualFriends,
        Attribute::Threads,
    ];

    /// Key used when the record is filled from an API lookup
    pub fn key(&self) -> &'static str {
        match self {
            Attribute::Followers => "followers",
            Attribute::Following => "following",
            Attribute::Posts => "posts",
            Attribute::FullName => "full_name",
            Attribute::Username => "username",
            Attribute::Description => "description",
            Attribute::Avatar => "avatar",
            Attribute::Website => "website",
            Attribute::Private => "is_private",
            Attribute::MutualFriends => "mutual_friends",
            Attribute::Threads => "threads",
        }
    }

    /// Resolve a column or payload key to an attribute.
    ///
    /// Matching ignores case, surrounding whitespace, `#` prefixes and
    /// `_`/`-` vs space, so "#followers", "Followers" and "followers" agree.
    pub fn from_column(name: &str) -> Option<Self> {
        let normalized = normalize_name(name);
        let attr = match normalized.as_str() {
            "followers" | "follower count" | "followers count" => Attribute::Followers,
            "following" | "follows" | "following count" => Attribute::Following,
            "posts" | "post count" | "posts count" | "media count" => Attribute::Posts,
            "fullname" | "full name" | "name" | "display name" => Attribute::FullName,
            "username" | "user name" => Attribute::Username,
            "description" | "biography" | "bio text" => Attribute::Description,
            "avatar" | "has profile picture" | "profile pic url" => Attribute::Avatar,
            "website" | "external url" | "external link" | "has external url" => Attribute::Website,
            "private" | "is private" => Attribute::Private,
            "mutual friends" | "mutual" => Attribute::MutualFriends,
            "threads" | "has threads" => Attribute::Threads,
            _ => return None,
        };
        Some(attr)
    }
}

/// Lowercase, trim, drop `#`, fold `_` and `-` into spaces
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_start_matches('#')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// SOURCES
// ============================================================================

/// Counters the operator types in because the API does not expose them
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorCounters {
    pub posts: u32,
    pub mutual_friends: u32,
    pub threads: u32,
}

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    Api,
    TableRow,
    Manual,
}

/// The three raw source kinds, each with its own extraction strategy
#[derive(Debug, Clone)]
pub enum RawSource<'a> {
    /// API profile plus operator counters
    Api {
        profile: &'a AccountProfile,
        counters: OperatorCounters,
    },
    /// One row of an uploaded table
    TableRow {
        headers: &'a [String],
        row: &'a [String],
    },
    /// Feature values typed by hand, keyed by feature name
    Manual(&'a BTreeMap<String, f64>),
}

// ============================================================================
// RAW ACCOUNT RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAccountRecord {
    pub origin: RecordOrigin,
    pub fields: BTreeMap<String, FieldValue>,
}

impl RawAccountRecord {
    pub fn new(origin: RecordOrigin) -> Self {
        Self {
            origin,
            fields: BTreeMap::new(),
        }
    }

    pub fn from_source(source: &RawSource<'_>) -> Self {
        match source {
            RawSource::Api { profile, counters } => Self::from_api(profile, *counters),
            RawSource::TableRow { headers, row } => Self::from_row(headers, row),
            RawSource::Manual(values) => Self::from_manual(values),
        }
    }

    /// API payload with defaults for absent keys, counters layered on top.
    ///
    /// Counters are inserted last so the operator's values always win,
    /// even if the payload carried its own post count.
    pub fn from_api(profile: &AccountProfile, counters: OperatorCounters) -> Self {
        let mut record = Self::new(RecordOrigin::Api);
        record.insert(Attribute::Followers.key(), profile.followers);
        record.insert(Attribute::Following.key(), profile.following);
        record.insert(Attribute::FullName.key(), profile.full_name.as_str());
        record.insert(Attribute::Username.key(), profile.username.as_str());
        record.insert(Attribute::Description.key(), profile.description.as_str());
        record.insert(Attribute::Avatar.key(), profile.has_avatar);
        record.insert(Attribute::Website.key(), profile.has_website);
        record.insert(Attribute::Private.key(), profile.is_private);

        record.insert(Attribute::Posts.key(), counters.posts);
        record.insert(Attribute::MutualFriends.key(), counters.mutual_friends);
        record.insert(Attribute::Threads.key(), counters.threads);
        record
    }

    /// Columns as given; surplus cells are ignored, missing cells stay absent
    pub fn from_row(headers: &[String], row: &[String]) -> Self {
        let mut record = Self::new(RecordOrigin::TableRow);
        for (header, cell) in headers.iter().zip(row.iter()) {
            record.insert(header.clone(), cell.as_str());
        }
        record
    }

    pub fn from_manual(values: &BTreeMap<String, f64>) -> Self {
        let mut record = Self::new(RecordOrigin::Manual);
        for (name, value) in values {
            record.insert(name.clone(), *value);
        }
        record
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Exact-name lookup
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// First field whose name resolves to `attr`.
    ///
    /// The canonical key is tried first so API records never hit the
    /// alias scan.
    pub fn attribute(&self, attr: Attribute) -> Option<&FieldValue> {
        self.fields.get(attr.key()).or_else(|| {
            self.fields
                .iter()
                .find(|(name, _)| Attribute::from_column(name) == Some(attr))
                .map(|(_, value)| value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_aliases() {
        assert_eq!(Attribute::from_column("#followers"), Some(Attribute::Followers));
        assert_eq!(Attribute::from_column("Followers"), Some(Attribute::Followers));
        assert_eq!(Attribute::from_column("#follows"), Some(Attribute::Following));
        assert_eq!(Attribute::from_column("Has Profile Picture"), Some(Attribute::Avatar));
        assert_eq!(Attribute::from_column("External URL"), Some(Attribute::Website));
        assert_eq!(Attribute::from_column("full_name"), Some(Attribute::FullName));
        assert_eq!(Attribute::from_column("Fullname"), Some(Attribute::FullName));
        assert_eq!(Attribute::from_column("is_private"), Some(Attribute::Private));
        assert_eq!(Attribute::from_column("Following/Followers"), None);
    }

    #[test]
    fn test_every_key_resolves_to_itself() {
        for attr in Attribute::ALL {
            assert_eq!(Attribute::from_column(attr.key()), Some(attr), "{:?}", attr);
        }
    }

    #[test]
    fn test_field_value_numbers() {
        assert_eq!(FieldValue::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(FieldValue::from("True").as_number(), Some(1.0));
        assert_eq!(FieldValue::from("abc").as_number(), None);
        assert_eq!(FieldValue::from("NaN").as_number(), None);
        assert_eq!(FieldValue::from(false).as_number(), Some(0.0));
    }

    #[test]
    fn test_field_value_presence() {
        use crate::logic::features::derived::presence_flag;

        assert_eq!(presence_flag(&FieldValue::from("")), 0);
        assert_eq!(presence_flag(&FieldValue::from(" 0 ")), 0);
        assert_eq!(presence_flag(&FieldValue::from("False")), 0);
        assert_eq!(presence_flag(&FieldValue::from("1")), 1);
        assert_eq!(presence_flag(&FieldValue::from("https://example.com")), 1);
        assert_eq!(presence_flag(&FieldValue::from(false)), 0);
        assert_eq!(presence_flag(&FieldValue::from(2.0)), 1);
    }

    #[test]
    fn test_counters_override_api() {
        let profile = AccountProfile {
            followers: 10,
            ..Default::default()
        };
        let counters = OperatorCounters {
            posts: 7,
            mutual_friends: 2,
            threads: 1,
        };
        let record = RawAccountRecord::from_api(&profile, counters);
        assert_eq!(record.attribute(Attribute::Posts), Some(&FieldValue::Number(7.0)));
        assert_eq!(record.attribute(Attribute::Threads), Some(&FieldValue::Number(1.0)));
        assert_eq!(record.origin, RecordOrigin::Api);
    }

    #[test]
    fn test_row_record_uses_headers() {
        let headers = vec!["Username".to_string(), "#followers".to_string()];
        let row = vec!["jdoe".to_string(), "500".to_string()];
        let record = RawAccountRecord::from_row(&headers, &row);
        assert_eq!(record.get("#followers"), Some(&FieldValue::from("500")));
        assert_eq!(
            record.attribute(Attribute::Followers).and_then(FieldValue::as_number),
            Some(500.0)
        );
        assert_eq!(record.attribute(Attribute::Following), None);
    }
}
