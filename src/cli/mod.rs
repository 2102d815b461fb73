//! Command-line parsing for the popularity screener.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/selection code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Criterion;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "popfit", version, about = "Song-popularity regression screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: ingest, select, validate, test, compare variants.
    Run(RunArgs),
    /// Re-render diagnostic plots from a previously exported predictions CSV.
    Plot(PlotArgs),
}

/// Options for a pipeline run.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Tracks CSV path.
    #[arg(long)]
    pub tracks: Option<PathBuf>,

    /// Artists CSV path.
    #[arg(long)]
    pub artists: Option<PathBuf>,

    /// Run on a seeded synthetic dataset instead of reading CSVs.
    #[arg(long)]
    pub demo: bool,

    /// Number of synthetic tracks generated by --demo.
    #[arg(long, default_value_t = 2000)]
    pub demo_count: usize,

    /// Random seed for the train/validation/test partition (and --demo data).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Training fraction of the partition.
    #[arg(long, default_value_t = 0.6)]
    pub train_frac: f64,

    /// Validation fraction of the partition (the remainder is the test set).
    #[arg(long, default_value_t = 0.3)]
    pub valid_frac: f64,

    /// Information criterion for the stepwise selection policies.
    #[arg(long, value_enum, default_value_t = Criterion::Aic)]
    pub criterion: Criterion,

    /// Largest subset size examined by exhaustive search.
    #[arg(long, default_value_t = 8)]
    pub nvmax: usize,

    /// Keep only tracks released in this year or later.
    #[arg(long, default_value_t = 2000)]
    pub min_year: i32,

    /// Render ASCII diagnostic plots (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the winning model's held-out predictions to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the winning model (parameters + accuracy) to JSON.
    #[arg(long = "export-model")]
    pub export_model: Option<PathBuf>,
}

/// Options for plotting a saved predictions CSV.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Predictions CSV produced by `popfit run --export`.
    #[arg(long, value_name = "CSV")]
    pub predictions: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
