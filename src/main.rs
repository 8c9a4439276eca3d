//! powerstep - step-test metric engine CLI
//!
//! Loads a miner power-profile CSV, computes every metric and prints the
//! result as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Full result
//! powerstep data/r2_39_2025-08-28T09_40_10.csv
//!
//! # Condensed summary with a custom config
//! powerstep data/run.csv --config tuning.toml --summary
//!
//! # Print the effective configuration
//! powerstep --dump-config
//! ```
//!
//! # Exit Codes
//!
//! - `0`: every metric computed
//! - `1`: run completed with metric failures (`success = false`)
//! - `2`: the CSV or the configuration could not be loaded
//!
//! # Environment Variables
//!
//! - `POWERSTEP_CONFIG`: Path to an engine config TOML (same as `--config`)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use powerstep::config::{self, EngineConfig};
use powerstep::{ingest, orchestrator, RunSummary};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "powerstep")]
#[command(about = "Deterministic metric engine for miner power step tests")]
#[command(version)]
struct CliArgs {
    /// Path to the step-test CSV export
    #[arg(required_unless_present = "dump_config")]
    csv: Option<PathBuf>,

    /// Engine config TOML (falls back to ./powerstep.toml, then defaults)
    #[arg(long, value_name = "PATH", env = "POWERSTEP_CONFIG")]
    config: Option<PathBuf>,

    /// Print the condensed run summary instead of the full result
    #[arg(long)]
    summary: bool,

    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Print the effective engine configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,
}

// ============================================================================
// Output Envelope
// ============================================================================

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    source: String,
    generated_at: DateTime<Utc>,
    result: T,
}

fn render<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.context("Failed to serialize output")
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the metric run succeeded.
fn run(args: &CliArgs) -> Result<bool> {
    let engine_config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::load(),
    };
    config::init(engine_config);

    if args.dump_config {
        print!("{}", config::get().to_toml().context("Failed to render config")?);
        return Ok(true);
    }

    let Some(csv_path) = &args.csv else {
        anyhow::bail!("No CSV path given");
    };

    let loaded = ingest::load_csv(csv_path)
        .with_context(|| format!("Failed to load {}", csv_path.display()))?;

    let mut result = orchestrator::run(&loaded.series);
    // loader warnings come first, as they describe the input itself
    let mut warnings = loaded.warnings;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;

    info!(
        file = %csv_path.display(),
        success = result.success,
        phase = %result.phase,
        "Analysis complete"
    );

    let source = csv_path.display().to_string();
    let generated_at = Utc::now();
    let output = if args.summary {
        render(
            &Envelope {
                source,
                generated_at,
                result: RunSummary::from_result(&result),
            },
            args.compact,
        )?
    } else {
        render(
            &Envelope {
                source,
                generated_at,
                result: &result,
            },
            args.compact,
        )?
    };
    println!("{output}");

    Ok(result.success)
}
