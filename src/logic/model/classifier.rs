//! Classifier trait + serializable candidate families
//!
//! Each family implements `Classifier`; `Model` is the tagged variant the
//! trainer iterates over and the artifact bundle persists.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::boosting::GradientBoosting;
use super::forest::RandomForest;
use super::logistic::LogisticRegression;
use super::types::{ClassProbabilities, N_CLASSES};
use crate::error::TrainError;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum AttributionError {
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("class index {0} out of range")]
    ClassOutOfRange(usize),

    #[error("non-finite contribution for feature {0}")]
    NonFinite(usize),

    #[error("model has not been fitted")]
    NotFitted,
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Common interface for candidate model families
pub trait Classifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), TrainError>;

    /// `None` when the model output is unusable (unfitted, non-finite)
    fn predict_proba(&self, x: &[f64]) -> Option<ClassProbabilities>;

    /// Signed per-feature contribution to `class`'s output for this row
    fn contributions(&self, x: &[f64], class: usize) -> Result<Vec<f64>, AttributionError>;
}

/// Shared checks for `contributions` implementations
pub(crate) fn check_attribution_input(
    x: &[f64],
    n_features: usize,
    class: usize,
) -> Result<(), AttributionError> {
    if n_features == 0 {
        return Err(AttributionError::NotFitted);
    }
    if x.len() != n_features {
        return Err(AttributionError::DimensionMismatch {
            expected: n_features,
            actual: x.len(),
        });
    }
    if class >= N_CLASSES {
        return Err(AttributionError::ClassOutOfRange(class));
    }
    Ok(())
}

pub(crate) fn ensure_finite(contrib: Vec<f64>) -> Result<Vec<f64>, AttributionError> {
    match contrib.iter().position(|c| !c.is_finite()) {
        Some(i) => Err(AttributionError::NonFinite(i)),
        None => Ok(contrib),
    }
}

pub(crate) fn check_training_input(x: &Array2<f64>, y: &[usize]) -> Result<(), TrainError> {
    if x.nrows() == 0 {
        return Err(TrainError::EmptyDataset);
    }
    if x.nrows() != y.len() {
        return Err(TrainError::ShapeMismatch { rows: x.nrows(), labels: y.len() });
    }
    if let Some(((row, column), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(TrainError::NonFinite { row, column });
    }
    Ok(())
}

// ============================================================================
// CANDIDATE FAMILIES
// ============================================================================

/// Which families the trainer fits, in declared priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    LogisticRegression,
    RandomForest,
    GradientBoosting,
}

impl CandidateKind {
    pub const ALL: [CandidateKind; 3] = [
        CandidateKind::LogisticRegression,
        CandidateKind::RandomForest,
        CandidateKind::GradientBoosting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::LogisticRegression => "LogisticRegression",
            CandidateKind::RandomForest => "RandomForest",
            CandidateKind::GradientBoosting => "GradientBoosting",
        }
    }

    /// File-name form, same as the serde tag
    pub fn slug(&self) -> &'static str {
        match self {
            CandidateKind::LogisticRegression => "logistic_regression",
            CandidateKind::RandomForest => "random_forest",
            CandidateKind::GradientBoosting => "gradient_boosting",
        }
    }
}

/// Fitted (or to-be-fitted) model of any family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", content = "params", rename_all = "snake_case")]
pub enum Model {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl Model {
    /// Unfitted model with default hyper-parameters
    pub fn new(kind: CandidateKind, seed: u64) -> Self {
        match kind {
            CandidateKind::LogisticRegression => Model::LogisticRegression(LogisticRegression::default()),
            CandidateKind::RandomForest => Model::RandomForest(RandomForest::new(seed)),
            CandidateKind::GradientBoosting => Model::GradientBoosting(GradientBoosting::new(seed)),
        }
    }

    pub fn kind(&self) -> CandidateKind {
        match self {
            Model::LogisticRegression(_) => CandidateKind::LogisticRegression,
            Model::RandomForest(_) => CandidateKind::RandomForest,
            Model::GradientBoosting(_) => CandidateKind::GradientBoosting,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Model::LogisticRegression(m) => m,
            Model::RandomForest(m) => m,
            Model::GradientBoosting(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Model::LogisticRegression(m) => m,
            Model::RandomForest(m) => m,
            Model::GradientBoosting(m) => m,
        }
    }
}

impl Classifier for Model {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), TrainError> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &[f64]) -> Option<ClassProbabilities> {
        self.inner().predict_proba(x)
    }

    fn contributions(&self, x: &[f64], class: usize) -> Result<Vec<f64>, AttributionError> {
        self.inner().contributions(x, class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_model_kind_and_name() {
        for kind in CandidateKind::ALL {
            let model = Model::new(kind, 7);
            assert_eq!(model.kind(), kind);
            assert_eq!(model.name(), kind.as_str());
        }
    }

    #[test]
    fn test_unfitted_model_has_no_output() {
        let model = Model::new(CandidateKind::RandomForest, 1);
        assert!(model.predict_proba(&[0.0, 1.0]).is_none());
        assert!(matches!(model.contributions(&[0.0, 1.0], 0), Err(AttributionError::NotFitted)));
    }

    #[test]
    fn test_check_training_input() {
        let x = array![[0.0, 1.0], [1.0, f64::NAN]];
        assert!(matches!(
            check_training_input(&x, &[0, 1]),
            Err(TrainError::NonFinite { row: 1, column: 1 })
        ));
        assert!(matches!(
            check_training_input(&x, &[0]),
            Err(TrainError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_model_serde_tag() {
        let json = serde_json::to_value(Model::new(CandidateKind::LogisticRegression, 0)).unwrap();
        assert_eq!(json["family"], "logistic_regression");
    }
}
