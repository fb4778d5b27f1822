use serde::{Deserialize, Serialize};

use crate::logic::features::FeatureRecord;
use crate::logic::model::RiskCategory;

/// One training row: the student's features plus the observed outcome.
/// Serialized flat, so a JSONL line is the record's fields plus
/// `performance_category`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    #[serde(flatten)]
    pub record: FeatureRecord,
    pub performance_category: RiskCategory,
}

impl LabeledRecord {
    pub fn new(record: FeatureRecord, performance_category: RiskCategory) -> Self {
        Self { record, performance_category }
    }

    pub fn label(&self) -> usize {
        self.performance_category.index()
    }
}
