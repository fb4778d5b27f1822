use std::fs;

use anyhow::Context;

use student_risk_core::cli::{apply_overrides, parse_args, BatchArgs, Command, ScoreArgs, SynthArgs, TrainArgs};
use student_risk_core::constants::{APP_NAME, APP_VERSION};
use student_risk_core::logic::dataset::{self, LabeledRecord};
use student_risk_core::logic::train::{train_and_publish, TrainConfig};
use student_risk_core::{Config, FeatureRecord, ModelMetricsReport, RegistryStore, Scorer};

fn main() -> anyhow::Result<()> {
    let cli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let config = apply_overrides(Config::from_env(), &cli);
    let store = RegistryStore::from_config(&config);

    match &cli.command {
        Command::Synth(args) => synth(args, &config),
        Command::Train(args) => train(args, &config, &store),
        Command::Score(args) => score(args, &config, &store),
        Command::Batch(args) => batch(args, &config, &store),
        Command::Metrics => metrics(&store),
    }
}

fn synth(args: &SynthArgs, config: &Config) -> anyhow::Result<()> {
    let rows = dataset::generate(args.rows, config.seed);
    let n = dataset::write_jsonl(&args.out, &rows)
        .with_context(|| format!("writing {}", args.out.display()))?;
    log::info!("Generated {} student records -> {}", n, args.out.display());
    Ok(())
}

fn train(args: &TrainArgs, config: &Config, store: &RegistryStore) -> anyhow::Result<()> {
    let rows: Vec<LabeledRecord> = dataset::read_jsonl(&args.data)
        .with_context(|| format!("reading dataset {}", args.data.display()))?;

    let (registry, quality) = train_and_publish(&rows, TrainConfig::from(config), store)?;

    println!("{}", serde_json::to_string_pretty(&registry)?);
    if !quality.passed {
        log::warn!("Champion is below the minimum quality bar");
    }
    Ok(())
}

fn score(args: &ScoreArgs, config: &Config, store: &RegistryStore) -> anyhow::Result<()> {
    let scorer = Scorer::load(store, config)?;
    let data = fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let record: FeatureRecord = serde_json::from_slice(&data)?;

    let assessment = scorer.assess(&record)?;
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

fn batch(args: &BatchArgs, config: &Config, store: &RegistryStore) -> anyhow::Result<()> {
    let scorer = Scorer::load(store, config)?;
    let rows: Vec<Result<FeatureRecord, String>> = dataset::read_jsonl_rows(&args.input)
        .with_context(|| format!("reading batch {}", args.input.display()))?;

    let report = scorer.assess_rows(rows.iter().map(|r| r.as_ref().map_err(String::as_str)));
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = &args.log {
        let n = report.append_to(path).with_context(|| format!("appending to {}", path.display()))?;
        log::info!("Appended {} assessments -> {}", n, path.display());
    }

    match &args.out {
        Some(path) => fs::write(path, json).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn metrics(store: &RegistryStore) -> anyhow::Result<()> {
    let registry = store.load()?;
    let report = ModelMetricsReport::from_registry(registry.as_ref());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
