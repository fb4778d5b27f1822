//! Scoring Service
//!
//! `Scorer` is the loaded champion (encoder + engine + record), immutable
//! and shared through `Arc`. `ChampionSlot` holds the current scorer and
//! swaps it wholesale on reload; callers keep the `Arc` they cloned.
//!
//! Pipeline per record:
//!   record → encode → predict → rank factors → recommend → Assessment

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ScoringError, ScoringResult};
use crate::logic::dataset;
use crate::logic::explain::{self, TopFactor};
use crate::logic::features::{FeatureEncoder, FeatureRecord};
use crate::logic::model::{ClassProbabilities, EngineStatus, InferenceEngine, RiskCategory};
use crate::logic::policy::{self, Recommendation};
use crate::logic::registry::{ArtifactBundle, ChampionRecord, ModelMetricsReport, RegistryStore};

/// Flag set on assessments whose record needed imputation
pub const PARTIAL_DATA_FLAG: &str = "PARTIAL_DATA";

// ============================================================================
// OUTPUT TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub student_id: Option<String>,
    pub category: RiskCategory,
    pub dropout_probability: f64,
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub top_factors: Vec<TopFactor>,
    pub interventions: Vec<Recommendation>,
    pub model_version: String,
    pub data_quality_flag: Option<String>,
    pub predicted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// 0-based position in the submitted batch
    pub row: usize,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    pub row: usize,
    pub field: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub assessments: Vec<BatchItem>,
    pub errors: Vec<BatchError>,
    /// Rows superseded by a later row with the same student_id
    pub duplicates_dropped: Vec<usize>,
}

impl BatchReport {
    /// Append each assessment as one JSONL line to an assessment log.
    /// Returns the number of lines written.
    pub fn append_to(&self, path: &Path) -> io::Result<usize> {
        for item in &self.assessments {
            dataset::append_jsonl(path, item)?;
        }
        Ok(self.assessments.len())
    }
}

// ============================================================================
// SCORER
// ============================================================================

#[derive(Debug)]
pub struct Scorer {
    engine: InferenceEngine,
    encoder: FeatureEncoder,
    champion: ChampionRecord,
    max_missing_ratio: f64,
    top_factors: usize,
}

impl Scorer {
    pub fn new(bundle: ArtifactBundle, champion: ChampionRecord, config: &Config) -> Self {
        let n_features = bundle.encoder.feature_count();
        Self {
            engine: InferenceEngine::new(bundle.model, bundle.model_version, n_features),
            encoder: bundle.encoder,
            champion,
            max_missing_ratio: config.max_missing_ratio,
            top_factors: config.top_factors,
        }
    }

    /// Load the published champion; any registry problem is `ModelUnavailable`
    pub fn load(store: &RegistryStore, config: &Config) -> ScoringResult<Self> {
        let registry = store.require()?;
        let bundle = store.load_bundle(&registry)?;

        log::info!(
            "Loaded champion {} {} ({} features)",
            registry.champion.model_name,
            registry.champion.model_version,
            bundle.encoder.feature_count()
        );
        Ok(Self::new(bundle, registry.champion, config))
    }

    pub fn champion(&self) -> &ChampionRecord {
        &self.champion
    }

    pub fn status(&self) -> EngineStatus {
        self.engine.status()
    }

    /// Score without the completeness gate; missing values are imputed
    pub fn score(&self, record: &FeatureRecord) -> ScoringResult<Assessment> {
        let vector = self.encoder.encode(record);
        let prediction = self.engine.predict(&vector)?;

        let top_factors =
            explain::rank(&prediction.contributions, &self.encoder.order, record, self.top_factors);
        let interventions = policy::recommend(record, prediction.dropout_probability);

        Ok(Assessment {
            student_id: record.student_id.clone(),
            category: prediction.category,
            dropout_probability: prediction.dropout_probability,
            confidence: prediction.confidence,
            probabilities: prediction.probabilities,
            top_factors,
            interventions,
            model_version: self.engine.model_version().to_string(),
            data_quality_flag: (!record.is_complete()).then(|| PARTIAL_DATA_FLAG.to_string()),
            predicted_at: Utc::now(),
        })
    }

    /// Gate the record (identifier, ranges, completeness), then score it
    pub fn assess(&self, record: &FeatureRecord) -> ScoringResult<Assessment> {
        record.check(self.max_missing_ratio)?;
        self.score(record)
    }

    pub fn assess_batch(&self, records: &[FeatureRecord]) -> BatchReport {
        self.assess_rows(records.iter().map(Ok))
    }

    /// Row-wise batch where rows may already have failed to parse.
    /// Duplicate student_ids keep the last occurrence.
    pub fn assess_rows<'a, I>(&self, rows: I) -> BatchReport
    where
        I: IntoIterator<Item = Result<&'a FeatureRecord, &'a str>>,
    {
        let rows: Vec<Result<&FeatureRecord, &str>> = rows.into_iter().collect();

        let mut last_seen: HashMap<&str, usize> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            if let Some(id) = row.ok().and_then(|r| r.student_id.as_deref()) {
                last_seen.insert(id, i);
            }
        }

        let mut report = BatchReport::default();
        for (i, row) in rows.iter().enumerate() {
            let record = match row {
                Ok(record) => *record,
                Err(message) => {
                    log::warn!("Batch row {} unreadable: {}", i, message);
                    report.errors.push(BatchError { row: i, field: None, error: message.to_string() });
                    continue;
                }
            };

            let superseded = record
                .student_id
                .as_deref()
                .and_then(|id| last_seen.get(id))
                .is_some_and(|&last| last != i);
            if superseded {
                report.duplicates_dropped.push(i);
                continue;
            }

            match self.assess(record) {
                Ok(assessment) => report.assessments.push(BatchItem { row: i, assessment }),
                Err(e) => {
                    log::warn!("Batch row {} rejected: {}", i, e);
                    report.errors.push(BatchError {
                        row: i,
                        field: e.field().map(str::to_string),
                        error: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Batch scored: {} ok, {} errors, {} duplicates dropped",
            report.assessments.len(),
            report.errors.len(),
            report.duplicates_dropped.len()
        );
        report
    }
}

// ============================================================================
// CHAMPION SLOT
// ============================================================================

/// Current scorer, swappable on reload
#[derive(Debug, Default)]
pub struct ChampionSlot {
    current: RwLock<Option<Arc<Scorer>>>,
}

impl ChampionSlot {
    pub fn new(scorer: Scorer) -> Self {
        Self { current: RwLock::new(Some(Arc::new(scorer))) }
    }

    /// Slot loaded from the store, or empty when nothing is published yet
    pub fn open(store: &RegistryStore, config: &Config) -> Self {
        match Scorer::load(store, config) {
            Ok(scorer) => Self::new(scorer),
            Err(e) => {
                log::warn!("No champion loaded: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self) -> ScoringResult<Arc<Scorer>> {
        self.current
            .read()
            .clone()
            .ok_or_else(|| ScoringError::ModelUnavailable("no champion has been published".to_string()))
    }

    pub fn install(&self, scorer: Scorer) -> Arc<Scorer> {
        let scorer = Arc::new(scorer);
        *self.current.write() = Some(Arc::clone(&scorer));
        scorer
    }

    /// Load the latest champion and swap it in; on failure the old one stays
    pub fn reload(&self, store: &RegistryStore, config: &Config) -> ScoringResult<Arc<Scorer>> {
        let scorer = Scorer::load(store, config)?;
        Ok(self.install(scorer))
    }

    pub fn assess(&self, record: &FeatureRecord) -> ScoringResult<Assessment> {
        self.get()?.assess(record)
    }

    pub fn metrics_report(&self) -> ModelMetricsReport {
        match self.get() {
            Ok(scorer) => ModelMetricsReport::from_champion(scorer.champion()),
            Err(_) => ModelMetricsReport::unavailable(),
        }
    }
}
