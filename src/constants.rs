//! Central Configuration Constants
//!
//! Single source of truth for thresholds and defaults shared by the
//! training job and the scoring path.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name (also the data directory name)
pub const APP_NAME: &str = "student-risk";

// ============================================
// Training
// ============================================

/// Seed for splits, bootstraps and synthetic data
pub const DEFAULT_SEED: u64 = 42;

/// Held-out fraction for champion evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.20;

/// Registry file name inside the model directory
pub const REGISTRY_FILE: &str = "model_registry.json";

/// Minimum quality bar reported after training (informational)
pub const MIN_ACCURACY: f64 = 0.80;
pub const MIN_ROC_AUC: f64 = 0.80;
pub const MIN_F1_AT_RISK: f64 = 0.75;

// ============================================
// Serving
// ============================================

/// Records with more than this share of required fields missing are rejected
pub const DEFAULT_MAX_MISSING_RATIO: f64 = 0.30;

/// Number of attribution factors returned per assessment
pub const DEFAULT_TOP_FACTORS: usize = 3;

/// Attribution share thresholds for impact tiers
pub const IMPACT_HIGH_SHARE: f64 = 0.30;
pub const IMPACT_MEDIUM_SHARE: f64 = 0.10;

/// Registered-metric floors; falling below either flags drift
pub const DRIFT_MIN_ACCURACY: f64 = 0.70;
pub const DRIFT_MIN_ROC_AUC: f64 = 0.70;
