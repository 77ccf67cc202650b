//! csat_report - customer satisfaction survey reporting.
//!
//! Loads a survey export, builds a rating pivot and summary metrics per
//! cohort of sites, and writes everything to one XLSX workbook.
//!
//! Exit codes:
//!   0 - Report written
//!   1 - Invalid arguments, configuration, input or write failure
mod cli;
mod config;
mod error;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use types::CohortReport;
use util::format_int;

fn main() {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Report failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: write the default configuration file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
    }

    let content = Config::default_toml()?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;
    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// RUST_LOG wins when set; otherwise the level follows --verbose/--quiet.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Load → aggregate each cohort → preview → export.
fn run(args: &Args) -> Result<()> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;

    let settings = config.report_settings();
    let input = Path::new(&config.input.path);

    info!("Loading survey export: {}", input.display());
    let (survey, load_report) = loader::load_survey(input, config.input.skip_rows, settings.scale)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    info!(
        "{} rows read, {} responses ({} unrated)",
        format_int(load_report.raw_rows),
        format_int(load_report.records),
        format_int(load_report.unrated)
    );

    let reports: Vec<CohortReport> = config
        .cohorts
        .iter()
        .map(|cohort| {
            reports::compute_report(&survey.records, &config.survey.teams, cohort, &settings)
        })
        .collect();

    for report in &reports {
        if let Some(total) = report.grand_total() {
            info!(
                cohort = %report.cohort,
                received = total.feedback_received,
                requested = total.feedback_requested,
                rating = total.rating,
                response_pct = total.response_pct,
                "cohort report ready"
            );
            if total.feedback_received + total.feedback_requested == 0 {
                warn!(cohort = %report.cohort, "no responses matched this cohort");
            }
        }
        if args.show_preview() {
            output::preview_report(report);
        }
    }

    let output_path = Path::new(&config.output.path);
    output::write_workbook(output_path, &survey.raw, &reports, &config.output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    info!("Report saved to {}", output_path.display());
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
