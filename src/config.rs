//! Configuration file handling.
//!
//! Everything the report treats as fixed (team list, rating scale, cohort
//! site codes, thresholds, file locations) lives here and is loaded from a
//! `.csat_report.toml` file, with CLI overrides merged on top.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::types::{Cohort, RatingScale, ReportSettings, Thresholds};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".csat_report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Survey export location and shape.
    #[serde(default)]
    pub input: InputConfig,

    /// Workbook settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Teams and rating scale.
    #[serde(default)]
    pub survey: SurveyConfig,

    /// Reference thresholds copied into every summary row.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Site-code groups, one report sheet each.
    #[serde(default = "default_cohorts")]
    pub cohorts: Vec<Cohort>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            survey: SurveyConfig::default(),
            thresholds: ThresholdConfig::default(),
            cohorts: default_cohorts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the survey CSV export.
    #[serde(default = "default_input_path")]
    pub path: String,

    /// Metadata lines above the header row.
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            skip_rows: default_skip_rows(),
        }
    }
}

fn default_input_path() -> String {
    "csat_survey.csv".to_string()
}

fn default_skip_rows() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the generated workbook.
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Sheet holding the untouched survey export.
    #[serde(default = "default_raw_sheet")]
    pub raw_sheet: String,

    /// Appended to the cohort name to form its sheet name.
    #[serde(default = "default_sheet_suffix")]
    pub sheet_suffix: String,

    /// Columns from the pivot's last column to the summary's first; the
    /// default of 4 leaves three blank columns.
    #[serde(default = "default_summary_gap")]
    pub summary_gap: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            raw_sheet: default_raw_sheet(),
            sheet_suffix: default_sheet_suffix(),
            summary_gap: default_summary_gap(),
        }
    }
}

fn default_output_path() -> String {
    "CSAT_survey.xlsx".to_string()
}

fn default_raw_sheet() -> String {
    "survey".to_string()
}

fn default_sheet_suffix() -> String {
    " pivot_table".to_string()
}

fn default_summary_gap() -> u16 {
    4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Teams kept in the report, in display order.
    #[serde(default = "default_teams")]
    pub teams: Vec<String>,

    /// Lowest valid rating.
    #[serde(default = "default_rating_min")]
    pub rating_min: u8,

    /// Highest valid rating.
    #[serde(default = "default_rating_max")]
    pub rating_max: u8,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            teams: default_teams(),
            rating_min: default_rating_min(),
            rating_max: default_rating_max(),
        }
    }
}

fn default_teams() -> Vec<String> {
    vec!["Endpoint", "Network Services", "Server And Datacenter"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_rating_min() -> u8 {
    1
}

fn default_rating_max() -> u8 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_low_rating")]
    pub low_rating: u32,

    #[serde(default = "default_low_response")]
    pub low_response: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            low_rating: default_low_rating(),
            low_response: default_low_response(),
        }
    }
}

fn default_low_rating() -> u32 {
    4
}

fn default_low_response() -> u32 {
    15
}

fn default_cohorts() -> Vec<Cohort> {
    vec![
        Cohort::new("asia", ["IN", "JP", "KR", "TH"]),
        Cohort::new("china", ["CN"]),
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line (or through their env vars)
    /// replace file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.display().to_string();
        }
        if let Some(ref output) = args.output {
            self.output.path = output.display().to_string();
        }
        if let Some(skip_rows) = args.skip_rows {
            self.input.skip_rows = skip_rows;
        }
    }

    /// Check the settings the aggregation relies on.
    pub fn validate(&self) -> Result<()> {
        if self.survey.teams.is_empty() {
            bail!("At least one team must be configured");
        }
        let mut seen = HashSet::new();
        for team in &self.survey.teams {
            if !seen.insert(team.as_str()) {
                bail!("Team {:?} is listed more than once", team);
            }
        }

        if self.survey.rating_min > self.survey.rating_max {
            bail!(
                "rating_min ({}) is greater than rating_max ({})",
                self.survey.rating_min,
                self.survey.rating_max
            );
        }

        if self.cohorts.is_empty() {
            bail!("At least one cohort must be configured");
        }

        // A site in two cohorts would be counted on both sheets.
        let mut names = HashSet::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for cohort in &self.cohorts {
            if !names.insert(cohort.name.as_str()) {
                bail!("Cohort {:?} is defined more than once", cohort.name);
            }
            if cohort.sites.is_empty() {
                bail!("Cohort {:?} has no site codes", cohort.name);
            }
            for site in &cohort.sites {
                if let Some(other) = owners.insert(site.as_str(), cohort.name.as_str()) {
                    if other != cohort.name {
                        bail!(
                            "Site {:?} belongs to both cohort {:?} and cohort {:?}",
                            site,
                            other,
                            cohort.name
                        );
                    }
                }
            }
        }

        if self.output.raw_sheet.trim().is_empty() {
            bail!("output.raw_sheet must not be empty");
        }

        Ok(())
    }

    /// Aggregation settings derived from the survey and threshold sections.
    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            scale: RatingScale::new(self.survey.rating_min, self.survey.rating_max),
            thresholds: Thresholds {
                low_rating: self.thresholds.low_rating,
                low_response: self.thresholds.low_response,
            },
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        let config = Config::default();
        toml::to_string_pretty(&config).context("Failed to serialize default configuration")
    }
}
