//! Feature Layout - Centralized Field & Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add field → increment FEATURE_VERSION
//! 2. Change default order → increment FEATURE_VERSION
//! 3. Remove field → increment FEATURE_VERSION
//!
//! A trained bundle records its own `FeatureOrder` (names + CRC32). Serving
//! always rebuilds vectors in the recorded order, never in input order.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current schema version
/// MUST be incremented when the schema changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FIELD SCHEMA (Authoritative source)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Identifies the record, never a model feature
    Identifier,
    Numeric,
    Categorical,
    Boolean,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind, required: true }
}

/// Every field a record carries, in canonical order
pub const FIELD_SCHEMA: &[FieldSpec] = &[
    field("student_id", FieldKind::Identifier),      // excluded from features
    field("age", FieldKind::Numeric),                // 0
    field("gender", FieldKind::Categorical),         // 1
    field("department", FieldKind::Categorical),     // 2
    field("semester", FieldKind::Numeric),           // 3
    field("attendance_pct", FieldKind::Numeric),     // 4
    field("assignment_score_avg", FieldKind::Numeric), // 5
    field("internal_marks_avg", FieldKind::Numeric), // 6
    field("semester_gpa", FieldKind::Numeric),       // 7
    field("study_hours_per_week", FieldKind::Numeric), // 8
    field("participation_score", FieldKind::Numeric), // 9
    field("prev_semester_gpa", FieldKind::Numeric),  // 10
    field("backlogs", FieldKind::Numeric),           // 11
    field("financial_aid", FieldKind::Boolean),      // 12
];

/// Number of model features in the default order
/// IMPORTANT: Must match the non-identifier entries of FIELD_SCHEMA!
pub const FEATURE_COUNT: usize = 13;

/// Fields translated through a `CategoryEncoding`
pub const CATEGORICAL_FEATURES: &[&str] = &["gender", "department"];

/// Substitute for a missing categorical value
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Look up a field by name
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELD_SCHEMA.iter().find(|f| f.name == name)
}

/// Names of all required fields (identifier included)
pub fn required_fields() -> impl Iterator<Item = &'static str> {
    FIELD_SCHEMA.iter().filter(|f| f.required).map(|f| f.name)
}

// ============================================================================
// FEATURE ORDER
// ============================================================================

/// Ordered feature names frozen at training time, plus their CRC32
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureOrder {
    pub version: u8,
    pub hash: u32,
    pub names: Vec<String>,
}

impl FeatureOrder {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: compute_layout_hash(&names),
            names,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Get feature index by name (O(n) but features are few)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Check the stored hash/version and that every name is a known feature
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        let actual_hash = compute_layout_hash(&self.names);
        if self.version != FEATURE_VERSION || self.hash != actual_hash {
            return Err(LayoutMismatchError::Hash {
                expected_version: FEATURE_VERSION,
                expected_hash: actual_hash,
                actual_version: self.version,
                actual_hash: self.hash,
            });
        }

        for name in &self.names {
            match field_spec(name) {
                Some(spec) if spec.kind != FieldKind::Identifier => {}
                _ => return Err(LayoutMismatchError::UnknownFeature(name.clone())),
            }
        }

        Ok(())
    }
}

impl Default for FeatureOrder {
    /// Schema order minus the identifier, the order training uses
    fn default() -> Self {
        Self::new(
            FIELD_SCHEMA
                .iter()
                .filter(|f| f.kind != FieldKind::Identifier)
                .map(|f| f.name.to_string())
                .collect(),
        )
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over version + names; detects layout mismatches at load time
pub fn compute_layout_hash(names: &[String]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum LayoutMismatchError {
    #[error(
        "feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), got v{actual_version} (hash: {actual_hash:08x})"
    )]
    Hash {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("feature `{0}` is not part of the record schema")]
    UnknownFeature(String),
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        let order = FeatureOrder::default();
        assert_eq!(order.len(), FEATURE_COUNT);
        assert_eq!(FIELD_SCHEMA.len(), FEATURE_COUNT + 1);
    }

    #[test]
    fn test_default_order_excludes_identifier() {
        let order = FeatureOrder::default();
        assert_eq!(order.index_of("student_id"), None);
        assert_eq!(order.name(0), Some("age"));
        assert_eq!(order.name(12), Some("financial_aid"));
    }

    #[test]
    fn test_layout_hash_consistency() {
        let a = FeatureOrder::default();
        let b = FeatureOrder::default();
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, 0);
    }

    #[test]
    fn test_hash_depends_on_order() {
        let mut names = FeatureOrder::default().names;
        let original = compute_layout_hash(&names);
        names.swap(0, 1);
        assert_ne!(compute_layout_hash(&names), original);
    }

    #[test]
    fn test_validate_success() {
        assert!(FeatureOrder::default().validate().is_ok());
    }

    #[test]
    fn test_validate_hash_mismatch() {
        let mut order = FeatureOrder::default();
        order.hash = order.hash.wrapping_add(1);
        assert!(matches!(order.validate(), Err(LayoutMismatchError::Hash { .. })));
    }

    #[test]
    fn test_validate_unknown_feature() {
        let order = FeatureOrder::new(vec!["age".into(), "shoe_size".into()]);
        assert!(matches!(
            order.validate(),
            Err(LayoutMismatchError::UnknownFeature(name)) if name == "shoe_size"
        ));
    }

    #[test]
    fn test_field_spec() {
        assert_eq!(field_spec("gender").map(|f| f.kind), Some(FieldKind::Categorical));
        assert_eq!(field_spec("financial_aid").map(|f| f.kind), Some(FieldKind::Boolean));
        assert!(field_spec("nonexistent").is_none());
        assert_eq!(required_fields().count(), 14);
    }
}
