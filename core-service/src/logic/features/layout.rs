//! Feature Layout - Loaded Feature Schema
//!
//! **The schema controls vector order.**
//!
//! The classifier was trained on one ordered list of column names. Every
//! vector built for it must follow that order exactly, and every batch
//! upload must carry those columns. The list is loaded once from the
//! artifact store and never changes afterwards.
//!
//! Two layouts are known from training:
//! - `account_counts`: raw counts (Followers, Following, Posts, Bio, ...)
//! - `lexical`: lexical ratios (fullname words, nums/length username, ...)

use std::collections::HashSet;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;

// ============================================================================
// LAYOUT VERSION
// ============================================================================

/// Version of the schema artifact format, mixed into the layout hash
pub const SCHEMA_FORMAT_VERSION: u8 = 1;

/// Raw-count layout (10 features)
pub const ACCOUNT_COUNTS_LAYOUT: &[&str] = &[
    "Followers",
    "Following",
    "Following/Followers",
    "Posts",
    "Posts/Followers",
    "Bio",
    "Profile Picture",
    "External Link",
    "Mutual Friends",
    "Threads",
];

/// Lexical-ratio layout (11 features)
pub const LEXICAL_LAYOUT: &[&str] = &[
    "profile pic",
    "nums/length username",
    "fullname words",
    "nums/length fullname",
    "name==username",
    "description length",
    "external URL",
    "private",
    "#posts",
    "#followers",
    "#follows",
];

/// Which known layout a loaded schema matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    AccountCounts,
    Lexical,
    Custom,
}

// ============================================================================
// FEATURE SCHEMA
// ============================================================================

/// Ordered feature names the classifier expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
    hash: u32,
}

impl FeatureSchema {
    /// Build a schema from ordered names.
    ///
    /// Rejects an empty list and duplicate names, since either would make
    /// column lookup ambiguous.
    pub fn new<I, S>(names: I) -> Result<Self, ArtifactError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if names.is_empty() {
            return Err(ArtifactError::Incompatible("feature schema is empty".to_string()));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(ArtifactError::Incompatible(format!(
                    "duplicate feature name in schema: {}",
                    name
                )));
            }
        }

        let hash = compute_layout_hash(&names);
        Ok(Self { names, hash })
    }

    /// Parse the schema artifact (a JSON array of strings)
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let names: Vec<String> = serde_json::from_slice(bytes).map_err(|e| ArtifactError::Parse {
            name: "feature schema".to_string(),
            message: e.to_string(),
        })?;
        Self::new(names)
    }

    pub fn account_counts() -> Self {
        Self::from_static(ACCOUNT_COUNTS_LAYOUT)
    }

    pub fn lexical() -> Self {
        Self::from_static(LEXICAL_LAYOUT)
    }

    fn from_static(layout: &[&str]) -> Self {
        let names: Vec<String> = layout.iter().map(|s| s.to_string()).collect();
        let hash = compute_layout_hash(&names);
        Self { names, hash }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// CRC32 of the ordered names
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Get feature index by name (O(n) but features are few)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn variant(&self) -> SchemaVariant {
        if self.iter().eq(ACCOUNT_COUNTS_LAYOUT.iter().copied()) {
            SchemaVariant::AccountCounts
        } else if self.iter().eq(LEXICAL_LAYOUT.iter().copied()) {
            SchemaVariant::Lexical
        } else {
            SchemaVariant::Custom
        }
    }

    pub fn layout_info(&self) -> LayoutInfo {
        LayoutInfo {
            version: SCHEMA_FORMAT_VERSION,
            hash: self.hash,
            variant: self.variant(),
            feature_count: self.len(),
            feature_names: self.names.clone(),
        }
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of a feature layout
/// Used to detect vectors built against a different schema
pub fn compute_layout_hash(names: &[String]) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[SCHEMA_FORMAT_VERSION]);

    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub variant: SchemaVariant,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================
