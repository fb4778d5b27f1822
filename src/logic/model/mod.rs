//! Model Module - candidate classifiers and the inference engine
//!
//! Three pure-Rust families behind one `Classifier` trait; the champion is
//! wrapped by `InferenceEngine` for serving.

pub mod types;
pub mod classifier;
pub mod tree;
pub mod logistic;
pub mod forest;
pub mod boosting;
pub mod inference;

// Re-export common types
pub use types::{ClassProbabilities, RiskCategory, N_CLASSES};
pub use classifier::{AttributionError, CandidateKind, Classifier, Model};
pub use logistic::LogisticRegression;
pub use forest::RandomForest;
pub use boosting::GradientBoosting;
pub use inference::{EngineStatus, InferenceEngine, PredictionResult};
