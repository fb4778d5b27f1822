//! Student Risk - Scoring Core
//!
//! Trains and publishes a champion classifier, then scores student records
//! into assessments: risk category, dropout probability, top factors and
//! recommended interventions.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logic;

pub use config::Config;
pub use error::{RegistryError, ScoringError, ScoringResult, TrainError};
pub use logic::features::FeatureRecord;
pub use logic::registry::{ModelMetricsReport, RegistryStore};
pub use logic::service::{Assessment, BatchReport, ChampionSlot, Scorer};
