//! CLI argument parsing
//!
//! ```bash
//! student-risk synth --out data/students.jsonl
//! student-risk train data/students.jsonl
//! student-risk score record.json
//! student-risk batch cohort.jsonl --out assessments.json --log history.jsonl
//! student-risk metrics
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::logic::dataset::DEFAULT_COHORT_SIZE;

/// Student Risk: train, score, explain, recommend
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "student-risk")]
#[command(version)]
#[command(about = "Dropout-risk scoring core: champion training, scoring and drift checks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Override MODEL_DIR (registry + artifact bundles)
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Generate a synthetic labeled cohort (JSONL)
    Synth(SynthArgs),

    /// Train candidates and publish the champion
    Train(TrainArgs),

    /// Assess one student record (JSON)
    Score(ScoreArgs),

    /// Assess a JSONL batch row by row
    Batch(BatchArgs),

    /// Print the champion metrics report and drift warning
    Metrics,
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SynthArgs {
    /// Output JSONL path
    #[arg(short, long)]
    pub out: PathBuf,

    #[arg(short, long, default_value_t = DEFAULT_COHORT_SIZE)]
    pub rows: usize,

    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Labeled JSONL dataset
    #[arg(value_name = "DATASET")]
    pub data: PathBuf,

    /// Override TRAIN_SEED
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override TEST_FRACTION
    #[arg(long)]
    pub test_fraction: Option<f64>,
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ScoreArgs {
    /// JSON file holding one record
    #[arg(value_name = "RECORD")]
    pub input: PathBuf,
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct BatchArgs {
    /// JSONL file, one record per line
    #[arg(value_name = "BATCH")]
    pub input: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Also append each assessment to this JSONL log
    #[arg(long)]
    pub log: Option<PathBuf>,
}

pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Layer CLI overrides on top of the environment config
pub fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(dir) = &cli.model_dir {
        config = config.with_model_dir(dir);
    }
    match &cli.command {
        Command::Synth(args) => {
            if let Some(seed) = args.seed {
                config.seed = seed;
            }
        }
        Command::Train(args) => {
            if let Some(seed) = args.seed {
                config.seed = seed;
            }
            if let Some(f) = args.test_fraction.filter(|f| *f > 0.0 && *f < 1.0) {
                config.test_fraction = f;
            }
        }
        _ => {}
    }
    config
}
