//! Inference Engine
//!
//! Wraps the fitted champion model: vector in, class probabilities and raw
//! per-feature contributions out. Built once per loaded champion and shared
//! read-only; latency counters are atomics so `&self` is enough.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::classifier::{CandidateKind, Classifier, Model};
use super::types::{ClassProbabilities, RiskCategory};
use crate::error::{ScoringError, ScoringResult};
use crate::logic::features::EncodedVector;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Engine status for the health surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_name: String,
    pub model_version: String,
    pub avg_latency_ms: f64,
    pub inference_count: u64,
}

/// Prediction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub category: RiskCategory,
    pub probabilities: ClassProbabilities,
    /// Mass on the predicted class
    pub confidence: f64,
    /// Mass on "At Risk", independent of the predicted class
    pub dropout_probability: f64,
    /// Signed contributions toward `category`, in FeatureOrder.
    /// Empty when attribution failed.
    pub contributions: Vec<f64>,
    pub inference_time_us: u64,
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug)]
pub struct InferenceEngine {
    model: Model,
    model_version: String,
    n_features: usize,

    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl InferenceEngine {
    pub fn new(model: Model, model_version: impl Into<String>, n_features: usize) -> Self {
        Self {
            model,
            model_version: model_version.into(),
            n_features,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        }
    }

    pub fn kind(&self) -> CandidateKind {
        self.model.kind()
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn predict(&self, vector: &EncodedVector) -> ScoringResult<PredictionResult> {
        let start = Instant::now();

        if vector.len() != self.n_features {
            return Err(ScoringError::VectorLength {
                expected: self.n_features,
                actual: vector.len(),
            });
        }

        let probabilities = self.model.predict_proba(vector.as_slice()).ok_or_else(|| {
            ScoringError::Inference(format!("{} produced no usable probabilities", self.model.name()))
        })?;
        let category = probabilities.argmax();

        let contributions = match self.model.contributions(vector.as_slice(), category.index()) {
            Ok(c) => c,
            Err(e) => {
                log::debug!("Attribution failed ({}), returning prediction without factors", e);
                Vec::new()
            }
        };

        let elapsed = start.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(elapsed, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(PredictionResult {
            category,
            confidence: probabilities.confidence(),
            dropout_probability: probabilities.at_risk(),
            probabilities,
            contributions,
            inference_time_us: elapsed,
        })
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_name: self.model.name().to_string(),
            model_version: self.model_version.clone(),
            avg_latency_ms: avg,
            inference_count: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::tree::{DecisionTree, TreeNode};
    use crate::logic::model::{GradientBoosting, LogisticRegression};
    use ndarray::array;

    fn engine() -> InferenceEngine {
        let x = array![
            [-2.0, 0.0], [-1.9, 0.1], [0.0, 2.0], [0.1, 1.9], [2.0, 0.0], [1.9, -0.1],
        ];
        let mut model = Model::LogisticRegression(LogisticRegression::default());
        model.fit(&x, &[0, 0, 1, 1, 2, 2]).unwrap();
        InferenceEngine::new(model, "v1.0", 2)
    }

    #[test]
    fn test_predict_fields() {
        let engine = engine();
        let result = engine.predict(&EncodedVector::new(vec![2.0, 0.0])).unwrap();

        assert_eq!(result.category, RiskCategory::AtRisk);
        assert_eq!(result.contributions.len(), 2);
        let sum: f64 = result.probabilities.as_array().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(result.dropout_probability, result.probabilities.at_risk());
        assert_eq!(result.confidence, result.probabilities.confidence());
        assert_eq!(engine.status().inference_count, 1);
    }

    #[test]
    fn test_wrong_vector_length() {
        let engine = engine();
        let err = engine.predict(&EncodedVector::new(vec![1.0])).unwrap_err();
        assert!(matches!(err, ScoringError::VectorLength { expected: 2, actual: 1 }));
    }

    fn leaf(value: f64) -> TreeNode {
        TreeNode { feature: None, threshold: 0.0, left: 0, right: 0, value: vec![value] }
    }

    #[test]
    fn test_attribution_failure_keeps_prediction() {
        // The At-Risk tree's path step (MAX - -MAX) overflows while its leaf stays finite
        let split = TreeNode { feature: Some(0), threshold: 0.0, left: 1, right: 2, value: vec![-f64::MAX] };
        let at_risk = DecisionTree { nodes: vec![split, leaf(f64::MAX), leaf(f64::MAX)] };
        let flat = || DecisionTree { nodes: vec![leaf(0.0)] };

        let mut model = GradientBoosting::new(0);
        model.learning_rate = 1.0;
        model.n_features = 1;
        model.trees = vec![vec![flat(), flat(), at_risk]];
        let model = Model::GradientBoosting(model);
        assert!(model.contributions(&[1.0], 2).is_err());

        let engine = InferenceEngine::new(model, "v1.0", 1);
        let result = engine.predict(&EncodedVector::new(vec![1.0])).unwrap();

        assert_eq!(result.category, RiskCategory::AtRisk);
        assert!(result.contributions.is_empty());
        assert_eq!(result.dropout_probability, 1.0);
        assert_eq!(engine.status().inference_count, 1);
    }
}
