use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use serde_json::json;
use ticket_triage::{pipeline, ModelStore, TicketClassifier, TrainingConfig, TrainingOptions};

#[derive(Parser)]
#[command(author, version, about = "Support ticket auto-triage", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a classifier on a CSV dataset and persist the model bundle
    Train {
        #[arg(long)]
        data_path: PathBuf,
        #[arg(long)]
        model_path: PathBuf,
        /// Share of each category held out for the printed report
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,
        /// Seed for the stratified split
        #[arg(long, default_value_t = 42)]
        random_state: u64,
        /// JSON object of parameter overrides, e.g. '{"clf__C": 0.5}'
        #[arg(long, default_value = "")]
        params: String,
    },
    /// Evaluate a persisted model against a CSV dataset
    Evaluate {
        #[arg(long)]
        data_path: PathBuf,
        #[arg(long)]
        model_path: PathBuf,
        /// Where to write the full metrics as JSON
        #[arg(long)]
        report_path: Option<PathBuf>,
    },
    /// Classify a single ticket
    Predict {
        /// Defaults to $MODEL_PATH, then models/model.bin
        #[arg(long)]
        model_path: Option<PathBuf>,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Measure warm prediction latency
    Latency {
        #[arg(long)]
        model_path: Option<PathBuf>,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = 200)]
        num_runs: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let env = env_logger::Env::default().default_filter_or("info");
    let mut logger = env_logger::Builder::from_env(env);
    if args.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    match args.command {
        Command::Train { data_path, model_path, test_size, random_state, params } => {
            train(data_path, model_path, test_size, random_state, &params)
        }
        Command::Evaluate { data_path, model_path, report_path } => {
            evaluate(data_path, model_path, report_path)
        }
        Command::Predict { model_path, subject, description } => {
            let classifier = load_classifier(model_path)?;
            let prediction = classifier.predict(&subject, &description);
            println!("{}", serde_json::to_string(&prediction)?);
            Ok(())
        }
        Command::Latency { model_path, subject, description, num_runs } => {
            latency(model_path, &subject, &description, num_runs)
        }
    }
}

fn train(
    data_path: PathBuf,
    model_path: PathBuf,
    test_size: f64,
    seed: u64,
    params: &str,
) -> Result<()> {
    let mut config = TrainingConfig::default();
    if !params.is_empty() {
        config
            .apply_json_overrides(params)
            .context("Invalid --params")?;
    }
    info!("Training configuration: {:?}", config);

    let options = TrainingOptions {
        test_fraction: test_size,
        seed,
        config,
    };
    let start = Instant::now();
    let outcome = pipeline::train_to_path(&data_path, &model_path, &options)
        .with_context(|| format!("Training on {} failed", data_path.display()))?;
    info!("=== Training complete (took {:.2?}) ===", start.elapsed());

    println!("{}", outcome.metrics);
    println!("{}", serde_json::to_string_pretty(&outcome.metrics)?);
    Ok(())
}

fn evaluate(data_path: PathBuf, model_path: PathBuf, report_path: Option<PathBuf>) -> Result<()> {
    let metrics = pipeline::evaluate_path(&data_path, &model_path)
        .with_context(|| format!("Evaluating {} failed", model_path.display()))?;

    if let Some(path) = report_path {
        metrics.write_json(&path)?;
    }

    println!("{}", serde_json::to_string_pretty(&json!({ "accuracy": metrics.accuracy }))?);
    Ok(())
}

fn load_classifier(model_path: Option<PathBuf>) -> Result<TicketClassifier> {
    let path = model_path.unwrap_or_else(ModelStore::default_path);
    TicketClassifier::load(&path)
        .with_context(|| format!("Failed to load model from {}", path.display()))
}

fn latency(
    model_path: Option<PathBuf>,
    subject: &str,
    description: &str,
    num_runs: usize,
) -> Result<()> {
    anyhow::ensure!(num_runs > 0, "--num-runs must be at least 1");
    let classifier = load_classifier(model_path)?;

    for _ in 0..10 {
        classifier.predict(subject, description);
    }

    let mut durations_ms = Vec::with_capacity(num_runs);
    let start_all = Instant::now();
    for _ in 0..num_runs {
        let start = Instant::now();
        let _ = classifier.predict(subject, description);
        durations_ms.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    let wall_ms = start_all.elapsed().as_secs_f64() * 1000.0;

    durations_ms.sort_by(|a, b| a.total_cmp(b));
    let median = if num_runs % 2 == 1 {
        durations_ms[num_runs / 2]
    } else {
        (durations_ms[num_runs / 2 - 1] + durations_ms[num_runs / 2]) / 2.0
    };
    let p90 = durations_ms[((0.9 * num_runs as f64) as usize).min(num_runs - 1)];
    let mean = durations_ms.iter().sum::<f64>() / num_runs as f64;
    let round = |v: f64| (v * 1000.0).round() / 1000.0;

    println!(
        "{}",
        json!({
            "runs": num_runs,
            "p50_ms": round(median),
            "p90_ms": round(p90),
            "mean_ms": round(mean),
            "min_ms": round(durations_ms[0]),
            "max_ms": round(durations_ms[num_runs - 1]),
            "wall_ms": round(wall_ms),
        })
    );
    Ok(())
}
