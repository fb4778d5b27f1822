//! Model metrics report for the health surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{ChampionRecord, Registry};
use crate::logic::drift;
use crate::logic::train::metrics::{ConfusionMatrix, ModelMetrics};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetricsReport {
    pub model_name: String,
    pub model_version: String,
    pub accuracy: f64,
    pub roc_auc: f64,
    pub f1_at_risk: f64,
    pub precision_at_risk: f64,
    pub recall_at_risk: f64,
    pub macro_f1: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub drift_warning: bool,
    pub trained_at: Option<DateTime<Utc>>,
}

impl ModelMetricsReport {
    /// Zeroed report with the drift warning raised
    pub fn unavailable() -> Self {
        Self::from_metrics("none", "none", &ModelMetrics::default(), true, None)
    }

    pub fn from_registry(registry: Option<&Registry>) -> Self {
        match registry {
            Some(registry) => Self::from_champion(&registry.champion),
            None => Self::unavailable(),
        }
    }

    pub fn from_champion(champion: &ChampionRecord) -> Self {
        Self::from_metrics(
            &champion.model_name,
            &champion.model_version,
            &champion.metrics,
            drift::detect(Some(&champion.metrics)),
            Some(champion.trained_at),
        )
    }

    fn from_metrics(
        name: &str,
        version: &str,
        m: &ModelMetrics,
        drift_warning: bool,
        trained_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            model_name: name.to_string(),
            model_version: version.to_string(),
            accuracy: m.accuracy,
            roc_auc: m.roc_auc,
            f1_at_risk: m.f1_at_risk,
            precision_at_risk: m.precision_at_risk,
            recall_at_risk: m.recall_at_risk,
            macro_f1: m.macro_f1,
            confusion_matrix: m.confusion_matrix.clone(),
            drift_warning,
            trained_at,
        }
    }
}
