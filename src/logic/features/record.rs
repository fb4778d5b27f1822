//! Feature Record - one student at the time of assessment
//!
//! Every field is optional; `FIELD_SCHEMA` says which ones are required.
//! Range checks mirror the intake schema and run through `validator`.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::layout::{required_fields, FIELD_SCHEMA};
use crate::error::ScoringError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeatureRecord {
    pub student_id: Option<String>,

    #[validate(range(min = 15, max = 60))]
    pub age: Option<u32>,

    pub gender: Option<String>,
    pub department: Option<String>,

    #[validate(range(min = 1, max = 8))]
    pub semester: Option<u32>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub attendance_pct: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub assignment_score_avg: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub internal_marks_avg: Option<f64>,

    #[validate(range(min = 0.0, max = 10.0))]
    pub semester_gpa: Option<f64>,

    #[validate(range(min = 0.0, max = 168.0))]
    pub study_hours_per_week: Option<f64>,

    #[validate(range(min = 0.0, max = 10.0))]
    pub participation_score: Option<f64>,

    #[validate(range(min = 0.0, max = 10.0))]
    pub prev_semester_gpa: Option<f64>,

    pub backlogs: Option<u32>,

    pub financial_aid: Option<bool>,
}

/// A borrowed, pre-encoding field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Number(f64),
    Text(&'a str),
    Flag(bool),
}

impl RawValue<'_> {
    /// Numeric view; flags count as 0/1, text has none
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            RawValue::Number(v) => Some(v),
            RawValue::Flag(b) => Some(if b { 1.0 } else { 0.0 }),
            RawValue::Text(_) => None,
        }
    }
}

impl FeatureRecord {
    /// Field lookup by schema name
    pub fn value(&self, name: &str) -> Option<RawValue<'_>> {
        match name {
            "student_id" => self.student_id.as_deref().map(RawValue::Text),
            "age" => self.age.map(|v| RawValue::Number(v as f64)),
            "gender" => self.gender.as_deref().map(RawValue::Text),
            "department" => self.department.as_deref().map(RawValue::Text),
            "semester" => self.semester.map(|v| RawValue::Number(v as f64)),
            "attendance_pct" => self.attendance_pct.map(RawValue::Number),
            "assignment_score_avg" => self.assignment_score_avg.map(RawValue::Number),
            "internal_marks_avg" => self.internal_marks_avg.map(RawValue::Number),
            "semester_gpa" => self.semester_gpa.map(RawValue::Number),
            "study_hours_per_week" => self.study_hours_per_week.map(RawValue::Number),
            "participation_score" => self.participation_score.map(RawValue::Number),
            "prev_semester_gpa" => self.prev_semester_gpa.map(RawValue::Number),
            "backlogs" => self.backlogs.map(|v| RawValue::Number(v as f64)),
            "financial_aid" => self.financial_aid.map(RawValue::Flag),
            _ => None,
        }
    }

    /// Numeric value for display, 0 when absent or non-numeric
    pub fn numeric_or_zero(&self, name: &str) -> f64 {
        self.value(name)
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Required fields that are absent (blank strings count as absent)
    pub fn missing_fields(&self) -> Vec<&'static str> {
        required_fields()
            .filter(|name| match self.value(name) {
                None => true,
                Some(RawValue::Text(s)) => s.trim().is_empty(),
                Some(RawValue::Number(v)) => v.is_nan(),
                Some(RawValue::Flag(_)) => false,
            })
            .collect()
    }

    /// Share of required fields missing, in [0, 1]
    pub fn missing_ratio(&self) -> f64 {
        let required = FIELD_SCHEMA.iter().filter(|f| f.required).count();
        if required == 0 {
            return 0.0;
        }
        self.missing_fields().len() as f64 / required as f64
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Caller-side gate: identifier present, ranges valid, completeness ratio
    /// within `max_missing_ratio`.
    pub fn check(&self, max_missing_ratio: f64) -> Result<(), ScoringError> {
        if self.student_id.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(ScoringError::InvalidRecord {
                field: "student_id".to_string(),
                message: "missing required identifier".to_string(),
            });
        }

        if let Err(errors) = self.validate() {
            // Report the first failing field in schema order
            let failed: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
            let field = FIELD_SCHEMA
                .iter()
                .map(|f| f.name.to_string())
                .find(|name| failed.contains(name))
                .or_else(|| failed.into_iter().min())
                .unwrap_or_else(|| "record".to_string());
            return Err(ScoringError::InvalidRecord {
                field,
                message: "value out of range".to_string(),
            });
        }

        let missing_ratio = self.missing_ratio();
        if missing_ratio > max_missing_ratio {
            return Err(ScoringError::InsufficientData {
                missing_ratio,
                max_ratio: max_missing_ratio,
            });
        }

        Ok(())
    }
}
