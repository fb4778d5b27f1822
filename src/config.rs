//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::constants::{
    APP_NAME, DEFAULT_MAX_MISSING_RATIO, DEFAULT_SEED, DEFAULT_TEST_FRACTION,
    DEFAULT_TOP_FACTORS, REGISTRY_FILE,
};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding artifact bundles and the registry
    pub model_dir: PathBuf,

    /// Registry pointer file
    pub registry_path: PathBuf,

    /// Seed for the training split and candidate fitting
    pub seed: u64,

    /// Held-out fraction used for champion evaluation
    pub test_fraction: f64,

    /// Completeness gate for incoming records
    pub max_missing_ratio: f64,

    /// Attribution factors per assessment
    pub top_factors: usize,
}

impl Default for Config {
    fn default() -> Self {
        let model_dir = default_model_dir();
        Self {
            registry_path: model_dir.join(REGISTRY_FILE),
            model_dir,
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            max_missing_ratio: DEFAULT_MAX_MISSING_RATIO,
            top_factors: DEFAULT_TOP_FACTORS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let model_dir = env::var("MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir());

        let registry_path = env::var("MODEL_REGISTRY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| model_dir.join(REGISTRY_FILE));

        Self {
            registry_path,
            model_dir,
            seed: parse_env("TRAIN_SEED").unwrap_or(DEFAULT_SEED),
            test_fraction: parse_env("TEST_FRACTION")
                .filter(|f: &f64| *f > 0.0 && *f < 1.0)
                .unwrap_or(DEFAULT_TEST_FRACTION),
            max_missing_ratio: parse_env("MAX_MISSING_RATIO")
                .filter(|r: &f64| (0.0..=1.0).contains(r))
                .unwrap_or(DEFAULT_MAX_MISSING_RATIO),
            top_factors: parse_env("TOP_FACTORS").unwrap_or(DEFAULT_TOP_FACTORS),
        }
    }

    /// Same settings rooted at another model directory
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self.registry_path = self.model_dir.join(REGISTRY_FILE);
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

/// `<data_local_dir>/student-risk/models`, or `./models` when unavailable
pub fn default_model_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("models")
}
