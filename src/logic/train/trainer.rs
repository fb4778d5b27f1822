//! Candidate Trainer & Champion Selector
//!
//! Fits every candidate family on the same stratified split, scores them on
//! the held-out rows, and picks one champion:
//!   1. highest F1 on "At Risk"
//!   2. then highest macro-F1
//!   3. then declared priority (logistic, forest, boosting)

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metrics::ModelMetrics;
use super::split::stratified_split;
use crate::config::Config;
use crate::constants::{DEFAULT_SEED, DEFAULT_TEST_FRACTION, MIN_ACCURACY, MIN_F1_AT_RISK, MIN_ROC_AUC};
use crate::error::TrainError;
use crate::logic::dataset::LabeledRecord;
use crate::logic::features::{FeatureEncoder, FeatureOrder, FeatureRecord};
use crate::logic::model::{CandidateKind, Classifier, Model};
use crate::logic::registry::{
    label_map, ArtifactBundle, CandidateMetrics, ChampionRecord, Publication, Registry, RegistryStore,
};

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub seed: u64,
    pub test_fraction: f64,
    /// Families to fit, in priority order
    pub candidates: Vec<CandidateKind>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            candidates: CandidateKind::ALL.to_vec(),
        }
    }
}

impl From<&Config> for TrainConfig {
    fn from(config: &Config) -> Self {
        Self {
            seed: config.seed,
            test_fraction: config.test_fraction,
            ..Self::default()
        }
    }
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub metric: String,
    pub value: f64,
    pub minimum: f64,
    pub passed: bool,
}

/// Champion vs the minimum deployment bar (informational, never blocks publish)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub checks: Vec<QualityCheck>,
    pub passed: bool,
}

impl QualityReport {
    pub fn evaluate(metrics: &ModelMetrics) -> Self {
        let checks: Vec<QualityCheck> = [
            ("accuracy", metrics.accuracy, MIN_ACCURACY),
            ("roc_auc", metrics.roc_auc, MIN_ROC_AUC),
            ("f1_at_risk", metrics.f1_at_risk, MIN_F1_AT_RISK),
        ]
        .into_iter()
        .map(|(metric, value, minimum)| QualityCheck {
            metric: metric.to_string(),
            value,
            minimum,
            passed: value >= minimum,
        })
        .collect();

        Self {
            passed: checks.iter().all(|c| c.passed),
            checks,
        }
    }
}

// ============================================================================
// CHAMPION SELECTION
// ============================================================================

fn priority(kind: CandidateKind) -> usize {
    CandidateKind::ALL.iter().position(|k| *k == kind).unwrap_or(usize::MAX)
}

/// Index of the champion among `candidates`, `None` if empty
pub fn select_champion(candidates: &[CandidateMetrics]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.metrics
                .f1_at_risk
                .partial_cmp(&b.metrics.f1_at_risk)
                .unwrap_or(Ordering::Equal)
                .then(a.metrics.macro_f1.partial_cmp(&b.metrics.macro_f1).unwrap_or(Ordering::Equal))
                // Earlier in priority wins, so it must compare as greater
                .then(priority(b.candidate).cmp(&priority(a.candidate)))
        })
        .map(|(i, _)| i)
}

// ============================================================================
// TRAINER
// ============================================================================

#[derive(Debug, Clone)]
pub struct FittedCandidate {
    pub model: Model,
    pub metrics: ModelMetrics,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub encoder: FeatureEncoder,
    pub candidates: Vec<FittedCandidate>,
    pub champion: usize,
    pub quality: QualityReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl TrainingOutcome {
    pub fn champion(&self) -> &FittedCandidate {
        &self.candidates[self.champion]
    }

    pub fn candidate_metrics(&self) -> Vec<CandidateMetrics> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(i, c)| CandidateMetrics {
                model_name: c.model.name().to_string(),
                candidate: c.model.kind(),
                metrics: c.metrics.clone(),
                is_champion: i == self.champion,
                artifact: String::new(),
                checksum: String::new(),
            })
            .collect()
    }

    /// Split into the bundles to persist and the registry pointing at them.
    /// File names and checksums are filled in by `RegistryStore::publish`.
    pub fn into_registry(self, model_version: &str) -> Publication {
        let all_models = self.candidate_metrics();
        let FittedCandidate { model, metrics } = self.champion().clone();
        let Self { run_id, trained_at, encoder, candidates, train_rows, test_rows, .. } = self;

        let bundle_of = |model: Model| ArtifactBundle {
            model_version: model_version.to_string(),
            encoder: encoder.clone(),
            model,
        };
        let bundles: Vec<ArtifactBundle> = candidates.into_iter().map(|c| bundle_of(c.model)).collect();

        let record = ChampionRecord {
            model_name: model.name().to_string(),
            candidate: model.kind(),
            model_version: model_version.to_string(),
            run_id,
            is_champion: true,
            metrics,
            feature_order: encoder.order.clone(),
            label_map: label_map(),
            artifact: String::new(),
            checksum: String::new(),
            trained_at,
            train_rows,
            test_rows,
        };

        Publication {
            champion: bundle_of(model),
            candidates: bundles,
            registry: Registry { champion: record, all_models },
        }
    }
}

pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn train(&self, dataset: &[LabeledRecord]) -> Result<TrainingOutcome, TrainError> {
        if dataset.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        let run_id = Uuid::new_v4();
        log::info!("Training run {} on {} rows", run_id, dataset.len());

        let labels: Vec<usize> = dataset.iter().map(LabeledRecord::label).collect();
        let split = stratified_split(&labels, self.config.test_fraction, self.config.seed)?;

        let pick = |rows: &[usize]| -> (Vec<FeatureRecord>, Vec<usize>) {
            rows.iter().map(|&i| (dataset[i].record.clone(), labels[i])).unzip()
        };
        let (train_records, y_train) = pick(&split.train);
        let (test_records, y_test) = pick(&split.test);

        let (encoder, x_train) = FeatureEncoder::fit(&train_records, FeatureOrder::default())?;
        let x_test = encoder.encode_batch(&test_records);

        let mut candidates = Vec::new();
        for &kind in &self.config.candidates {
            let mut model = Model::new(kind, self.config.seed);
            if let Err(e) = model.fit(&x_train, &y_train) {
                log::warn!("Candidate {} failed to fit: {}", kind.as_str(), e);
                continue;
            }

            let metrics = ModelMetrics::evaluate(&model, &x_test, &y_test);
            log::info!(
                "{}: accuracy={:.4} roc_auc={:.4} f1_at_risk={:.4} macro_f1={:.4}",
                kind.as_str(),
                metrics.accuracy,
                metrics.roc_auc,
                metrics.f1_at_risk,
                metrics.macro_f1
            );
            candidates.push(FittedCandidate { model, metrics });
        }

        let mut outcome = TrainingOutcome {
            run_id,
            trained_at: Utc::now(),
            encoder,
            candidates,
            champion: 0,
            quality: QualityReport::evaluate(&ModelMetrics::default()),
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        };

        outcome.champion = select_champion(&outcome.candidate_metrics()).ok_or(TrainError::NoCandidate)?;
        outcome.quality = QualityReport::evaluate(&outcome.champion().metrics);

        log::info!(
            "Champion: {} (f1_at_risk={:.4})",
            outcome.champion().model.name(),
            outcome.champion().metrics.f1_at_risk
        );
        for check in outcome.quality.checks.iter().filter(|c| !c.passed) {
            log::warn!("Quality bar missed: {} {:.4} < {:.2}", check.metric, check.value, check.minimum);
        }

        Ok(outcome)
    }
}

/// Train, then publish the champion as the next registry version
pub fn train_and_publish(
    dataset: &[LabeledRecord],
    config: TrainConfig,
    store: &RegistryStore,
) -> Result<(Registry, QualityReport), TrainError> {
    let outcome = Trainer::new(config).train(dataset)?;
    let quality = outcome.quality.clone();
    let version = store.next_version()?;
    let registry = store.publish(outcome.into_registry(&version))?;
    Ok((registry, quality))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::train::metrics::ConfusionMatrix;

    fn candidate(kind: CandidateKind, f1_at_risk: f64, macro_f1: f64) -> CandidateMetrics {
        CandidateMetrics {
            model_name: kind.as_str().to_string(),
            candidate: kind,
            metrics: ModelMetrics {
                f1_at_risk,
                macro_f1,
                confusion_matrix: ConfusionMatrix::default(),
                ..Default::default()
            },
            is_champion: false,
            artifact: String::new(),
            checksum: String::new(),
        }
    }

    #[test]
    fn test_at_risk_f1_beats_macro_f1() {
        let candidates = vec![
            candidate(CandidateKind::LogisticRegression, 0.80, 0.95),
            candidate(CandidateKind::RandomForest, 0.85, 0.70),
            candidate(CandidateKind::GradientBoosting, 0.82, 0.90),
        ];
        assert_eq!(select_champion(&candidates), Some(1));
    }

    #[test]
    fn test_tie_breaks_on_macro_f1_then_priority() {
        let candidates = vec![
            candidate(CandidateKind::LogisticRegression, 0.85, 0.80),
            candidate(CandidateKind::RandomForest, 0.85, 0.82),
            candidate(CandidateKind::GradientBoosting, 0.85, 0.82),
        ];
        assert_eq!(select_champion(&candidates), Some(1));

        let full_tie = vec![
            candidate(CandidateKind::GradientBoosting, 0.9, 0.9),
            candidate(CandidateKind::LogisticRegression, 0.9, 0.9),
        ];
        assert_eq!(select_champion(&full_tie), Some(1));
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(select_champion(&[]), None);
    }

    #[test]
    fn test_quality_report() {
        let report = QualityReport::evaluate(&ModelMetrics {
            accuracy: 0.9,
            roc_auc: 0.95,
            f1_at_risk: 0.7,
            ..Default::default()
        });
        assert!(!report.passed);
        assert_eq!(report.checks.iter().filter(|c| !c.passed).count(), 1);
        assert_eq!(report.checks[2].metric, "f1_at_risk");
    }

    #[test]
    fn test_empty_dataset() {
        assert!(matches!(
            Trainer::new(TrainConfig::default()).train(&[]),
            Err(TrainError::EmptyDataset)
        ));
    }
}
