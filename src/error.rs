//! Error handling
//!
//! One enum per layer: serving (`ScoringError`), artifact storage
//! (`RegistryError`) and the offline training job (`TrainError`).

use thiserror::Error;

pub type ScoringResult<T> = Result<T, ScoringError>;

// ============================================================================
// SERVING
// ============================================================================

#[derive(Debug, Error)]
pub enum ScoringError {
    /// No champion has been trained/published yet, or it could not be loaded.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Record failed range/shape validation.
    #[error("invalid record (field `{field}`): {message}")]
    InvalidRecord { field: String, message: String },

    /// Record has too many missing required fields to be scored.
    #[error(
        "insufficient data: {:.0}% of required fields missing (max {:.0}%)",
        .missing_ratio * 100.0,
        .max_ratio * 100.0
    )]
    InsufficientData { missing_ratio: f64, max_ratio: f64 },

    /// Encoded vector does not match the champion feature order.
    #[error("feature vector length {actual} does not match feature order ({expected})")]
    VectorLength { expected: usize, actual: usize },

    /// Model produced an unusable probability distribution.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl ScoringError {
    /// True when the failure is "not trained yet" rather than a bad record.
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, ScoringError::ModelUnavailable(_))
    }

    /// Name of the offending field, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ScoringError::InvalidRecord { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }
}

impl From<RegistryError> for ScoringError {
    fn from(err: RegistryError) -> Self {
        ScoringError::ModelUnavailable(err.to_string())
    }
}

// ============================================================================
// REGISTRY / ARTIFACTS
// ============================================================================

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry not found at {0}")]
    NotFound(String),

    #[error("artifact checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Layout(#[from] crate::logic::features::layout::LayoutMismatchError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// TRAINING
// ============================================================================

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("class `{0}` has too few samples for a stratified split")]
    ClassTooSmall(String),

    #[error("design matrix has {rows} rows but {labels} labels")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("non-finite value in training data at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },

    #[error("{0} diverged during fitting")]
    Diverged(&'static str),

    #[error("every candidate failed to fit")]
    NoCandidate,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
