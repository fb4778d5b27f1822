//! Feature Encoder
//!
//! Raw `FeatureRecord` → `EncodedVector` in the frozen `FeatureOrder`:
//! impute, translate categoricals, coerce flags, then standardize with the
//! scaler fitted at training time. Pure function of (record, artifacts).

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::layout::{field_spec, FeatureOrder, FieldKind, CATEGORICAL_FEATURES, UNKNOWN_CATEGORY};
use super::record::{FeatureRecord, RawValue};
use crate::error::TrainError;

// ============================================================================
// ENCODED VECTOR
// ============================================================================

/// Ordered, scaled feature values; positions follow the champion FeatureOrder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedVector(Vec<f64>);

impl EncodedVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

// ============================================================================
// CATEGORY ENCODING
// ============================================================================

/// Frozen value → code tables, one per categorical field.
/// Codes are positions in the sorted list of values seen at training time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoding {
    classes: BTreeMap<String, Vec<String>>,
}

impl CategoryEncoding {
    pub fn fit(records: &[FeatureRecord]) -> Self {
        let mut classes = BTreeMap::new();

        for &field in CATEGORICAL_FEATURES {
            let seen: BTreeSet<String> = records
                .iter()
                .map(|r| categorical_value(r, field).to_string())
                .collect();
            classes.insert(field.to_string(), seen.into_iter().collect());
        }

        Self { classes }
    }

    /// Code for `value`; unseen values (and unknown fields) map to 0
    pub fn code(&self, field: &str, value: &str) -> usize {
        self.classes
            .get(field)
            .and_then(|values| values.binary_search_by(|v| v.as_str().cmp(value)).ok())
            .unwrap_or(0)
    }

    pub fn classes(&self, field: &str) -> Option<&[String]> {
        self.classes.get(field).map(Vec::as_slice)
    }
}

fn categorical_value<'a>(record: &'a FeatureRecord, field: &str) -> &'a str {
    match record.value(field) {
        Some(RawValue::Text(s)) if !s.trim().is_empty() => s,
        _ => UNKNOWN_CATEGORY,
    }
}

// ============================================================================
// STANDARD SCALER
// ============================================================================

/// Per-feature mean/variance normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Population statistics; zero-variance columns keep scale 1
    pub fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mean: Vec<f64> = x.sum_axis(Axis(0)).iter().map(|s| s / n).collect();
        let scale = x
            .axis_iter(Axis(1))
            .zip(&mean)
            .map(|(col, m)| {
                let var = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > 1e-12 { std } else { 1.0 }
            })
            .collect();

        Self { mean, scale }
    }

    pub fn transform_in_place(&self, row: &mut [f64]) {
        for ((v, m), s) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            *v = (*v - m) / s;
        }
    }
}

// ============================================================================
// FEATURE ENCODER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub order: FeatureOrder,
    pub categories: CategoryEncoding,
    pub scaler: StandardScaler,
}

impl FeatureEncoder {
    /// Fit encodings and scaler on training records.
    /// Returns the encoder and the scaled design matrix (rows follow input).
    pub fn fit(
        records: &[FeatureRecord],
        order: FeatureOrder,
    ) -> Result<(Self, Array2<f64>), TrainError> {
        if records.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        let categories = CategoryEncoding::fit(records);
        let mut encoder = Self {
            scaler: StandardScaler {
                mean: vec![0.0; order.len()],
                scale: vec![1.0; order.len()],
            },
            order,
            categories,
        };

        let mut x = Array2::<f64>::zeros((records.len(), encoder.order.len()));
        for (i, record) in records.iter().enumerate() {
            for (j, value) in encoder.raw_row(record).into_iter().enumerate() {
                if !value.is_finite() {
                    return Err(TrainError::NonFinite { row: i, column: j });
                }
                x[[i, j]] = value;
            }
        }

        encoder.scaler = StandardScaler::fit(&x);
        for mut row in x.rows_mut() {
            if let Some(slice) = row.as_slice_mut() {
                encoder.scaler.transform_in_place(slice);
            }
        }

        Ok((encoder, x))
    }

    /// Imputed + encoded values in FeatureOrder, before scaling
    pub fn raw_row(&self, record: &FeatureRecord) -> Vec<f64> {
        self.order
            .iter()
            .map(|name| {
                let kind = field_spec(name).map(|f| f.kind).unwrap_or(FieldKind::Numeric);
                match kind {
                    FieldKind::Categorical => {
                        self.categories.code(name, categorical_value(record, name)) as f64
                    }
                    FieldKind::Boolean => match record.value(name) {
                        Some(RawValue::Flag(true)) => 1.0,
                        Some(RawValue::Number(v)) if v != 0.0 => 1.0,
                        _ => 0.0,
                    },
                    FieldKind::Numeric | FieldKind::Identifier => record
                        .value(name)
                        .and_then(|v| v.as_f64())
                        .filter(|v| v.is_finite())
                        .unwrap_or(0.0),
                }
            })
            .collect()
    }

    pub fn encode(&self, record: &FeatureRecord) -> EncodedVector {
        let mut row = self.raw_row(record);
        self.scaler.transform_in_place(&mut row);
        EncodedVector(row)
    }

    /// Scaled design matrix for many records
    pub fn encode_batch(&self, records: &[FeatureRecord]) -> Array2<f64> {
        let mut x = Array2::<f64>::zeros((records.len(), self.order.len()));
        for (i, record) in records.iter().enumerate() {
            for (j, v) in self.encode(record).into_inner().into_iter().enumerate() {
                x[[i, j]] = v;
            }
        }
        x
    }

    pub fn feature_count(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, gender: &str, dept: &str, gpa: f64) -> FeatureRecord {
        FeatureRecord {
            student_id: Some(id.into()),
            age: Some(20),
            gender: Some(gender.into()),
            department: Some(dept.into()),
            semester: Some(2),
            attendance_pct: Some(80.0),
            assignment_score_avg: Some(70.0),
            internal_marks_avg: Some(65.0),
            semester_gpa: Some(gpa),
            study_hours_per_week: Some(15.0),
            participation_score: Some(6.0),
            prev_semester_gpa: Some(gpa - 0.2),
            backlogs: Some(1),
            financial_aid: Some(false),
        }
    }

    fn fitted() -> FeatureEncoder {
        let records = vec![
            record("a", "Male", "CS", 8.0),
            record("b", "Female", "ME", 6.0),
            record("c", "Other", "ECE", 4.0),
        ];
        FeatureEncoder::fit(&records, FeatureOrder::default()).unwrap().0
    }

    #[test]
    fn test_category_codes_are_sorted() {
        let encoder = fitted();
        assert_eq!(encoder.categories.code("gender", "Female"), 0);
        assert_eq!(encoder.categories.code("gender", "Male"), 1);
        assert_eq!(encoder.categories.code("gender", "Other"), 2);
        assert_eq!(encoder.categories.code("department", "ME"), 2);
    }

    #[test]
    fn test_unseen_category_maps_to_zero() {
        let encoder = fitted();
        assert_eq!(encoder.categories.code("department", "Astrophysics"), 0);

        let unseen = FeatureRecord {
            department: Some("Astrophysics".into()),
            ..record("z", "Male", "CS", 7.0)
        };
        let raw = encoder.raw_row(&unseen);
        let dept = encoder.order.index_of("department").unwrap();
        assert_eq!(raw[dept], 0.0);
    }

    #[test]
    fn test_missing_values_are_imputed() {
        let encoder = fitted();
        let raw = encoder.raw_row(&FeatureRecord::default());
        assert_eq!(raw.len(), encoder.feature_count());
        assert!(raw.iter().all(|v| *v == 0.0));
        assert!(encoder.encode(&FeatureRecord::default()).as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_boolean_coercion() {
        let encoder = fitted();
        let aid = encoder.order.index_of("financial_aid").unwrap();
        let with_aid = FeatureRecord { financial_aid: Some(true), ..record("x", "Male", "CS", 7.0) };
        assert_eq!(encoder.raw_row(&with_aid)[aid], 1.0);
    }

    #[test]
    fn test_scaled_training_columns_are_centered() {
        let records = vec![
            record("a", "Male", "CS", 8.0),
            record("b", "Female", "ME", 6.0),
            record("c", "Other", "ECE", 4.0),
        ];
        let (encoder, x) = FeatureEncoder::fit(&records, FeatureOrder::default()).unwrap();
        let gpa = encoder.order.index_of("semester_gpa").unwrap();
        let col_sum: f64 = x.column(gpa).sum();
        assert!(col_sum.abs() < 1e-9);
        // Constant column: scale falls back to 1 and values center to 0
        let age = encoder.order.index_of("age").unwrap();
        assert_eq!(encoder.scaler.scale[age], 1.0);
        assert!(x.column(age).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_encode_is_idempotent() {
        let encoder = fitted();
        let r = record("q", "Female", "ECE", 5.5);
        assert_eq!(encoder.encode(&r), encoder.encode(&r));
    }

    #[test]
    fn test_fit_rejects_empty() {
        assert!(matches!(
            FeatureEncoder::fit(&[], FeatureOrder::default()),
            Err(TrainError::EmptyDataset)
        ));
    }
}
