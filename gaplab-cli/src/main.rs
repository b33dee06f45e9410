//! GapLab CLI: overnight gap recovery analysis.
//!
//! Commands:
//! - `analyze`: derive thresholds, backtest, and validate one or more symbols
//!
//! Bars come from `<csv-dir>/<SYMBOL>.csv` when `--csv-dir` (or `[data] csv_dir`)
//! is given, otherwise from deterministic synthetic data.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gaplab_runner::{
    analyze_batch, render_summary, save_artifacts, BatchOutcome, OutputConfig, RunConfig,
    SymbolReport,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "gaplab",
    about = "GapLab CLI: overnight gap thresholds, recovery backtest, permutation validation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze overnight gap recovery for one or more symbols.
    Analyze {
        /// Symbols to analyze (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Path to a TOML run file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of <SYMBOL>.csv files (date,open,high,low,close,volume).
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Trading days of synthetic history when no CSV directory is set.
        #[arg(long)]
        days: Option<usize>,

        /// Last synthetic date (YYYY-MM-DD).
        #[arg(long)]
        end_date: Option<String>,

        /// Permutations in the Monte Carlo test.
        #[arg(long)]
        monte_carlo_samples: Option<usize>,

        /// Resamples in the threshold bootstrap.
        #[arg(long)]
        bootstrap_samples: Option<usize>,

        /// Master seed for all random streams.
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory for per-symbol artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print summaries only; write no files.
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Keep the full permutation null distribution in report.json.
        #[arg(long, default_value_t = false)]
        include_null: bool,
    },
}

/// Flag overrides applied on top of the run file.
struct Overrides {
    csv_dir: Option<PathBuf>,
    days: Option<usize>,
    end_date: Option<String>,
    monte_carlo_samples: Option<usize>,
    bootstrap_samples: Option<usize>,
    seed: Option<u64>,
    output_dir: Option<PathBuf>,
    no_save: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbols,
            config,
            csv_dir,
            days,
            end_date,
            monte_carlo_samples,
            bootstrap_samples,
            seed,
            output_dir,
            no_save,
            include_null,
        } => {
            let overrides = Overrides {
                csv_dir,
                days,
                end_date,
                monte_carlo_samples,
                bootstrap_samples,
                seed,
                output_dir,
                no_save,
            };
            run_analyze(symbols, config, overrides, include_null)
        }
    }
}

fn build_run_config(config_path: Option<PathBuf>, overrides: Overrides) -> Result<RunConfig> {
    let mut run = match config_path {
        Some(path) => RunConfig::from_file(&path)
            .with_context(|| format!("loading run file {}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(dir) = overrides.csv_dir {
        run.data.csv_dir = Some(dir);
    }
    if let Some(days) = overrides.days {
        run.data.synthetic_days = days;
    }
    if let Some(end) = overrides.end_date {
        let date = NaiveDate::parse_from_str(&end, "%Y-%m-%d")
            .with_context(|| format!("invalid --end-date '{end}'"))?;
        run.data.end_date = Some(date);
    }
    if let Some(n) = overrides.monte_carlo_samples {
        run.analysis.n_monte_carlo = n;
    }
    if let Some(n) = overrides.bootstrap_samples {
        run.analysis.n_bootstrap = n;
    }
    if let Some(seed) = overrides.seed {
        run.analysis.seed = seed;
    }
    if let Some(dir) = overrides.output_dir {
        run.output.dir = dir;
    }
    if overrides.no_save {
        run.output.save = false;
    }

    run.analysis
        .validate()
        .context("invalid analysis configuration")?;
    Ok(run)
}

fn run_analyze(
    symbols: Vec<String>,
    config_path: Option<PathBuf>,
    overrides: Overrides,
    include_null: bool,
) -> Result<()> {
    let run = build_run_config(config_path, overrides)?;
    info!(
        symbols = symbols.len(),
        config_hash = %run.config_hash(),
        signal_confidence = run.analysis.signal_level(),
        "configuration accepted"
    );

    let source = run.data.source();
    let outcome = analyze_batch(&symbols, source.as_ref(), &run.analysis)?;

    let save_failures = write_reports(&outcome, &run.output, include_null);

    for failure in &outcome.failures {
        warn!(symbol = %failure.symbol, error = %failure.error, "not analyzed");
        eprintln!("Error for {}: {}", failure.symbol, failure.error);
    }

    if outcome.analyses.is_empty() {
        bail!("no symbol could be analyzed");
    }
    if save_failures > 0 {
        bail!("artifacts could not be saved for {save_failures} symbol(s)");
    }
    Ok(())
}

/// Print each summary and save its artifacts. A symbol whose artifacts cannot
/// be written is reported and skipped; returns how many were skipped.
fn write_reports(outcome: &BatchOutcome, output: &OutputConfig, include_null: bool) -> usize {
    let mut save_failures = 0;
    for analysis in &outcome.analyses {
        let report = if include_null {
            SymbolReport::with_null_distribution(analysis)
        } else {
            SymbolReport::from_analysis(analysis)
        };
        println!("{}", render_summary(&report));

        if output.save {
            match save_artifacts(&report, analysis, &output.dir) {
                Ok(dir) => println!("Artifacts saved to: {}\n", dir.display()),
                Err(e) => {
                    save_failures += 1;
                    warn!(symbol = %analysis.symbol, error = %e, "artifacts not saved");
                    eprintln!("Error saving artifacts for {}: {}", analysis.symbol, e);
                }
            }
        }
    }
    save_failures
}
