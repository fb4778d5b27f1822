//! Drift Monitor
//!
//! Compares the champion's recorded quality against fixed floors. A missing
//! champion counts as drifted so the health surface always warns.

use serde::{Deserialize, Serialize};

use crate::constants::{DRIFT_MIN_ACCURACY, DRIFT_MIN_ROC_AUC};
use crate::logic::train::metrics::ModelMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftThresholds {
    pub min_accuracy: f64,
    pub min_roc_auc: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self {
            min_accuracy: DRIFT_MIN_ACCURACY,
            min_roc_auc: DRIFT_MIN_ROC_AUC,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    pub drift_detected: bool,
    pub accuracy: f64,
    pub roc_auc: f64,
    /// Human-readable reasons, empty when healthy
    pub reasons: Vec<String>,
}

impl DriftThresholds {
    pub fn check(&self, accuracy: f64, roc_auc: f64) -> DriftResult {
        let mut reasons = Vec::new();
        if accuracy < self.min_accuracy {
            reasons.push(format!("accuracy {:.4} below {:.2}", accuracy, self.min_accuracy));
        }
        if roc_auc < self.min_roc_auc {
            reasons.push(format!("roc_auc {:.4} below {:.2}", roc_auc, self.min_roc_auc));
        }

        DriftResult {
            drift_detected: !reasons.is_empty(),
            accuracy,
            roc_auc,
            reasons,
        }
    }
}

/// Drift on the default floors; `None` (no champion) is always drift
pub fn detect(metrics: Option<&ModelMetrics>) -> bool {
    match metrics {
        Some(m) => DriftThresholds::default().check(m.accuracy, m.roc_auc).drift_detected,
        None => true,
    }
}
