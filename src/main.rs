//! # Show the folds for 1200 samples with the configured splitter
//! ccs-modelling split --samples 1200 --config experiment.toml
//!
//! # Override splitter parameters and emit JSON
//! ccs-modelling split --samples 1200 --folds 4 --train-size 0.75 --margin 7 --json
//!
//! # Score per-fold predictions and print the summary and results table
//! ccs-modelling report --predictions predictions.json --config experiment.toml
//!
//! # Write a default configuration file
//! ccs-modelling init-config --output experiment.toml

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, warn};

use ccs_modelling::config::ExperimentConfig;
use ccs_modelling::cv::Fold;
use ccs_modelling::metrics::{results_table, score_regression_metrics, CrossValScores, Metric};

const SEPARATOR: &str = "=======================================";

#[derive(Parser)]
#[command(name = "ccs-modelling")]
#[command(about = "Blocking time-series cross-validation and regression scoring")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to experiment configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the train/test folds for a dataset size
    Split {
        /// Number of ordered samples in the dataset
        #[arg(short = 'n', long)]
        samples: usize,

        /// Number of folds (overrides config)
        #[arg(short = 'k', long)]
        folds: Option<usize>,

        /// Training fraction of each block (overrides config)
        #[arg(long)]
        train_size: Option<f64>,

        /// Gap between train and test windows (overrides config)
        #[arg(long)]
        margin: Option<usize>,

        /// Emit folds as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score per-fold predictions
    Report {
        /// JSON file with an array of {"train": {...}, "test": {...}} folds
        #[arg(short, long)]
        predictions: PathBuf,

        /// Comma-separated metrics to summarize
        #[arg(long, default_value = "rmse,mae,mape,r2")]
        metrics: String,
    },

    /// Write a default configuration file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "experiment.toml")]
        output: PathBuf,
    },
}

/// Targets and predictions for one side of a fold.
#[derive(Debug, Deserialize)]
struct PhasePredictions {
    y_true: Vec<f64>,
    y_pred: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct FoldPredictions {
    train: PhasePredictions,
    test: PhasePredictions,
}

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ExperimentConfig::default()),
    }
}

fn parse_metrics(list: &str) -> Result<Vec<Metric>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| Metric::parse(s).with_context(|| format!("Unknown metric: {}", s.trim())))
        .collect()
}

fn cmd_split(
    mut config: ExperimentConfig,
    samples: usize,
    folds: Option<usize>,
    train_size: Option<f64>,
    margin: Option<usize>,
    json: bool,
) -> Result<()> {
    if let Some(folds) = folds {
        config.splitter.n_splits = folds;
    }
    if let Some(train_size) = train_size {
        config.splitter.train_size = train_size;
    }
    if let Some(margin) = margin {
        config.splitter.margin = margin;
    }

    let splitter = config.splitter()?;
    let folds: Vec<Fold> = splitter.split_len(samples).collect();

    let empty_tests = folds.iter().filter(|f| f.test.is_empty()).count();
    if empty_tests > 0 {
        warn!(
            "{}/{} folds have an empty test window (margin {} too large for block size {})",
            empty_tests,
            folds.len(),
            splitter.margin(),
            splitter.block_size(samples)
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&folds)?);
        return Ok(());
    }

    let block_size = splitter.block_size(samples);
    println!("{}", SEPARATOR);
    println!("Samples: {}", samples);
    println!(
        "Folds: {}  Train size: {}  Margin: {}",
        splitter.n_splits(),
        splitter.train_size(),
        splitter.margin()
    );
    println!(
        "Block size: {}  Unused trailing samples: {}",
        block_size,
        samples - block_size * splitter.n_splits()
    );
    println!("{}", SEPARATOR);

    for fold in &folds {
        println!(
            "Fold {:>3}: train [{:>6}, {:>6}) {:>6} | test [{:>6}, {:>6}) {:>6}",
            fold.index + 1,
            fold.train.start,
            fold.train.end,
            fold.train_len(),
            fold.test.start,
            fold.test.end,
            fold.test_len()
        );
    }

    Ok(())
}

fn cmd_report(config: ExperimentConfig, predictions: PathBuf, metrics: &str) -> Result<()> {
    let metrics = parse_metrics(metrics)?;
    if metrics.is_empty() {
        bail!("No metrics selected");
    }

    let content = fs::read_to_string(&predictions)
        .with_context(|| format!("Failed to read {}", predictions.display()))?;
    let folds: Vec<FoldPredictions> =
        serde_json::from_str(&content).context("Invalid predictions file")?;
    info!("Loaded predictions for {} folds", folds.len());

    let mut scores = CrossValScores::default();
    for (i, fold) in folds.iter().enumerate() {
        let fold_scores = score_regression_metrics(
            &fold.train.y_true,
            &fold.train.y_pred,
            &fold.test.y_true,
            &fold.test.y_pred,
        )
        .with_context(|| format!("Failed to score fold {}", i + 1))?;
        scores.push(fold_scores);
    }

    let run = &config.run;
    println!("\n\n{}", SEPARATOR);
    println!("Company: {}", run.company);
    println!("Plant: {}", run.plant);
    println!("Model: {}", run.model);
    println!("{}\n\n", SEPARATOR);

    print!("{}", scores.report(&metrics));

    let table = results_table(run, &config.splitter, &scores)?;
    println!("{}", table);

    Ok(())
}

fn cmd_init_config(output: PathBuf) -> Result<()> {
    if output.exists() {
        bail!("{} already exists", output.display());
    }
    ExperimentConfig::create_default(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote default configuration to {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ccs_modelling=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            samples,
            folds,
            train_size,
            margin,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_split(config, samples, folds, train_size, margin, json)?;
        }
        Commands::Report {
            predictions,
            metrics,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_report(config, predictions, &metrics)?;
        }
        Commands::InitConfig { output } => {
            cmd_init_config(output)?;
        }
    }

    Ok(())
}
