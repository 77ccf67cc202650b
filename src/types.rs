use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::format_decimal;

/// Label used for both the total column and the total row.
pub const GRAND_TOTAL: &str = "Grand Total";

/// One row of the survey export as it appears on disk.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Team")]
    pub team: Option<String>,
    #[serde(rename = "IT Center")]
    pub it_center: Option<String>,
    #[serde(rename = "Survey RatingRest")]
    pub rating: Option<String>,
}

/// A validated survey response. `rating` is `None` when the survey was sent
/// but never answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub team: String,
    pub it_center: String,
    pub rating: Option<u8>,
}

impl ResponseRecord {
    pub fn new(team: &str, it_center: &str, rating: Option<u8>) -> Self {
        Self {
            team: team.to_string(),
            it_center: it_center.to_string(),
            rating,
        }
    }
}

/// Named group of site codes aggregated into one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub name: String,
    pub sites: Vec<String>,
}

impl Cohort {
    pub fn new<I, S>(name: &str, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            sites: sites.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, site: &str) -> bool {
        self.sites.iter().any(|s| s == site)
    }
}

/// Inclusive range of valid ordinal ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingScale {
    pub min: u8,
    pub max: u8,
}

impl RatingScale {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, rating: u8) -> bool {
        (self.min..=self.max).contains(&rating)
    }

    pub fn values(&self) -> impl Iterator<Item = u8> {
        self.min..=self.max
    }

    pub fn len(&self) -> usize {
        if self.max < self.min {
            0
        } else {
            (self.max - self.min) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column index of `rating` in a dense pivot row.
    pub fn index_of(&self, rating: u8) -> Option<usize> {
        self.contains(rating).then(|| (rating - self.min) as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub low_rating: u32,
    pub low_response: u32,
}

/// Everything the aggregation needs besides the records, teams and cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSettings {
    pub scale: RatingScale,
    pub thresholds: Thresholds,
}

/// One row of the cross-tabulation: counts per rating plus their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotRow {
    pub team: String,
    pub counts: Vec<u64>,
    pub total: u64,
}

/// Dense team × rating count matrix with a grand-total row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTable {
    pub ratings: Vec<u8>,
    pub rows: Vec<PivotRow>,
    pub grand_total: PivotRow,
}

impl PivotTable {
    /// Header labels after the team column: every rating, then the total.
    pub fn column_labels(&self) -> Vec<String> {
        self.ratings
            .iter()
            .map(|r| r.to_string())
            .chain(std::iter::once(GRAND_TOTAL.to_string()))
            .collect()
    }

    /// Team rows followed by the grand-total row.
    pub fn all_rows(&self) -> impl Iterator<Item = &PivotRow> {
        self.rows.iter().chain(std::iter::once(&self.grand_total))
    }
}

#[derive(Debug, Tabled, Clone, PartialEq)]
pub struct SummaryRow {
    #[tabled(rename = "Team")]
    pub label: String,
    #[tabled(rename = "SUM")]
    pub sum: u64,
    #[tabled(rename = "Response %", display_with = "format_decimal")]
    pub response_pct: f64,
    #[tabled(rename = "Rating", display_with = "format_decimal")]
    pub rating: f64,
    #[tabled(rename = "Low Rating")]
    pub low_rating: u32,
    #[tabled(rename = "Low Response")]
    pub low_response: u32,
    #[tabled(rename = "Feedback Requested")]
    pub feedback_requested: u64,
    #[tabled(rename = "Feedback Received")]
    pub feedback_received: u64,
}

/// Column headers of the summary as written to the workbook. The team label
/// is left out there because the rows line up with the pivot beside it.
pub const SUMMARY_COLUMNS: [&str; 7] = [
    "SUM",
    "Response %",
    "Rating",
    "Low Rating",
    "Low Response",
    "Feedback Requested",
    "Feedback Received",
];

/// Both tables produced for one cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortReport {
    pub cohort: String,
    pub pivot: PivotTable,
    pub summary: Vec<SummaryRow>,
}

impl CohortReport {
    pub fn grand_total(&self) -> Option<&SummaryRow> {
        self.summary.last()
    }
}

/// The untouched export, one `Vec<String>` per line.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}
