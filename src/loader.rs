use crate::error::{ReportError, Result};
use crate::types::{RatingScale, RawRow, RawTable, ResponseRecord};
use crate::util::{parse_rating, RatingCell};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::debug;

/// Header names the export must carry.
const REQUIRED_COLUMNS: [&str; 3] = ["Team", "IT Center", "Survey RatingRest"];

#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Lines in the raw sheet, metadata and header included.
    pub raw_rows: usize,
    pub records: usize,
    pub unrated: usize,
}

/// Everything read from one survey export.
#[derive(Debug, Clone)]
pub struct Survey {
    pub raw: RawTable,
    pub records: Vec<ResponseRecord>,
}

/// Read the export once and parse it twice: verbatim for the raw sheet, and
/// past the first `skip_rows` metadata lines into typed records.
pub fn load_survey(
    path: &Path,
    skip_rows: usize,
    scale: RatingScale,
) -> Result<(Survey, LoadReport)> {
    let content = std::fs::read_to_string(path)?;
    parse_survey(&content, skip_rows, scale)
}

pub fn parse_survey(
    content: &str,
    skip_rows: usize,
    scale: RatingScale,
) -> Result<(Survey, LoadReport)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let raw = parse_raw(content)?;
    let records = parse_records(content, skip_rows, scale)?;

    let report = LoadReport {
        raw_rows: raw.rows.len(),
        records: records.len(),
        unrated: records.iter().filter(|r| r.rating.is_none()).count(),
    };
    debug!(?report, "survey parsed");
    Ok((Survey { raw, records }, report))
}

fn parse_raw(content: &str) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { rows })
}

fn parse_records(content: &str, skip_rows: usize, scale: RatingScale) -> Result<Vec<ResponseRecord>> {
    let body = skip_lines(content, skip_rows);
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(body.as_bytes());

    let headers: StringRecord = rdr.headers()?.iter().map(str::trim).collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ReportError::MissingColumn(column.to_string()));
        }
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line()) + skip_rows as u64;
        let row: RawRow = record.deserialize(Some(&headers))?;

        let rating = match parse_rating(row.rating.as_deref(), scale) {
            RatingCell::Missing => None,
            RatingCell::Rated(v) => Some(v),
            RatingCell::Invalid => {
                return Err(ReportError::InvalidRating {
                    line,
                    value: row.rating.unwrap_or_default(),
                });
            }
        };

        records.push(ResponseRecord::new(
            row.team.as_deref().unwrap_or_default().trim(),
            row.it_center.as_deref().unwrap_or_default().trim(),
            rating,
        ));
    }
    Ok(records)
}

/// Slice off the first `n` lines. Returns an empty string when the input has
/// fewer lines.
fn skip_lines(content: &str, n: usize) -> &str {
    let offset: usize = content.split_inclusive('\n').take(n).map(str::len).sum();
    &content[offset..]
}
