//! Train Module - offline champion training
//!
//! - `split`   - stratified seeded split
//! - `metrics` - held-out evaluation
//! - `trainer` - candidate fitting, champion selection, publish

pub mod split;
pub mod metrics;
pub mod trainer;

pub use metrics::{ConfusionMatrix, ModelMetrics};
pub use trainer::{
    select_champion, train_and_publish, FittedCandidate, QualityCheck, QualityReport, TrainConfig,
    Trainer, TrainingOutcome,
};
