//! Model Registry - versioned champion record + artifact bundles
//!
//! Written only by the trainer, read by serving and the health surface.

pub mod types;
pub mod storage;
pub mod report;


pub use types::{label_map, ArtifactBundle, CandidateMetrics, ChampionRecord, Publication, Registry};
pub use storage::{bundle_file_name, candidate_file_name, sha256_hex, RegistryStore};
pub use report::ModelMetricsReport;
