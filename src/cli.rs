//! Command-line interface argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// csat_report - customer satisfaction survey report generator
///
/// Reads a survey CSV export, builds per-team rating pivots and summary
/// metrics for every configured cohort, and writes them to an XLSX workbook.
///
/// Examples:
///   csat_report --input export.csv
///   csat_report --input export.csv --output CSAT_survey.xlsx --skip-rows 0
///   csat_report --config reports/apac.toml --no-preview
///   csat_report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Survey CSV export to read
    ///
    /// Overrides `input.path` from the configuration file.
    #[arg(short, long, value_name = "FILE", env = "CSAT_INPUT")]
    pub input: Option<PathBuf>,

    /// Workbook to write
    ///
    /// Overrides `output.path` from the configuration file.
    #[arg(short, long, value_name = "FILE", env = "CSAT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .csat_report.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Metadata lines above the CSV header row
    #[arg(long, value_name = "N")]
    pub skip_rows: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no table preview)
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not print the report tables to the console
    #[arg(long)]
    pub no_preview: bool,

    /// Generate a default .csat_report.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }
        if let Some(ref input) = self.input {
            if input.as_os_str().is_empty() {
                return Err("Input path must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Whether the report tables should be printed.
    pub fn show_preview(&self) -> bool {
        !self.quiet && !self.no_preview
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from("export.csv")),
            output: None,
            config: None,
            skip_rows: None,
            verbose: false,
            quiet: false,
            no_preview: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "csat_report",
            "-i",
            "survey.csv",
            "--output",
            "out.xlsx",
            "--skip-rows",
            "0",
            "--no-preview",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("survey.csv")));
        assert_eq!(args.output, Some(PathBuf::from("out.xlsx")));
        assert_eq!(args.skip_rows, Some(0));
        assert!(!args.show_preview());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        assert!(args.validate().is_ok());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
        assert!(!args.show_preview());
    }

    #[test]
    fn test_merge_overrides_only_given_values() {
        let mut config = crate::config::Config::default();
        let mut args = make_args();
        args.skip_rows = Some(0);
        config.merge_with_args(&args);

        assert_eq!(config.input.path, "export.csv");
        assert_eq!(config.input.skip_rows, 0);
        assert_eq!(config.output.path, "CSAT_survey.xlsx");
    }
}
