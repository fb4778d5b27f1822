//! Registry Types
//!
//! `Registry` is the small pointer file serving reads; `ArtifactBundle` is
//! the versioned file it points at.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::features::{FeatureEncoder, FeatureOrder};
use crate::logic::model::{CandidateKind, Model, RiskCategory};
use crate::logic::train::metrics::ModelMetrics;

/// Held-out metrics of one candidate from a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetrics {
    pub model_name: String,
    pub candidate: CandidateKind,
    #[serde(flatten)]
    pub metrics: ModelMetrics,
    pub is_champion: bool,
    /// Candidate bundle file name; empty until published
    #[serde(default)]
    pub artifact: String,
    #[serde(default)]
    pub checksum: String,
}

/// The selected model of a run. Written once; the next run replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub model_name: String,
    pub candidate: CandidateKind,
    pub model_version: String,
    pub run_id: Uuid,
    pub is_champion: bool,
    #[serde(flatten)]
    pub metrics: ModelMetrics,
    pub feature_order: FeatureOrder,
    pub label_map: BTreeMap<String, usize>,
    /// Bundle file name, relative to the registry directory
    pub artifact: String,
    /// SHA-256 of the bundle bytes (hex)
    pub checksum: String,
    pub trained_at: DateTime<Utc>,
    pub train_rows: usize,
    pub test_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub champion: ChampionRecord,
    pub all_models: Vec<CandidateMetrics>,
}

/// Everything needed to rebuild the scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub model_version: String,
    pub encoder: FeatureEncoder,
    pub model: Model,
}

/// One training run ready to be written: the champion bundle, a bundle per
/// fitted candidate (champion included) and the registry pointing at them.
#[derive(Debug, Clone)]
pub struct Publication {
    pub champion: ArtifactBundle,
    pub candidates: Vec<ArtifactBundle>,
    pub registry: Registry,
}

/// "High" → 0, "Medium" → 1, "At Risk" → 2
pub fn label_map() -> BTreeMap<String, usize> {
    RiskCategory::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), c.index()))
        .collect()
}

/// "v{N}.0" → N
pub fn parse_version(version: &str) -> Option<u32> {
    version.strip_prefix('v')?.split('.').next()?.parse().ok()
}

pub fn format_version(n: u32) -> String {
    format!("v{}.0", n)
}
