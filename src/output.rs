use crate::config::OutputConfig;
use crate::error::Result;
use crate::types::{CohortReport, PivotTable, RawTable, SummaryRow, SUMMARY_COLUMNS};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table};
use tracing::debug;

/// Write the raw export plus one sheet per cohort report.
///
/// The workbook is assembled in memory and saved once at the end, so an error
/// while building it never leaves a file behind.
pub fn write_workbook(
    path: &Path,
    raw: &RawTable,
    reports: &[CohortReport],
    layout: &OutputConfig,
) -> Result<()> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(layout.raw_sheet.as_str())?;
    write_raw(sheet, raw)?;

    for report in reports {
        let name = format!("{}{}", report.cohort, layout.sheet_suffix);
        let sheet = workbook.add_worksheet();
        sheet.set_name(name.as_str())?;
        write_cohort(sheet, report, layout.summary_gap)?;
        debug!(sheet = %name, "cohort sheet written");
    }

    workbook.save(path)?;
    Ok(())
}

fn write_raw(sheet: &mut Worksheet, raw: &RawTable) -> Result<()> {
    for (r, cells) in raw.rows.iter().enumerate() {
        for (c, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let (row, col) = (row_num(r), col_num(c));
            match cell.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => sheet.write_number(row, col, n)?,
                _ => sheet.write_string(row, col, cell.as_str())?,
            };
        }
    }
    Ok(())
}

/// Pivot at A1; summary on the same rows, `gap` columns to its right.
fn write_cohort(sheet: &mut Worksheet, report: &CohortReport, gap: u16) -> Result<()> {
    let pivot = &report.pivot;
    let labels = pivot.column_labels();

    sheet.write_string(0, 0, "Team")?;
    for (c, label) in labels.iter().enumerate() {
        sheet.write_string(0, col_num(c + 1), label.as_str())?;
    }
    for (r, row) in pivot.all_rows().enumerate() {
        let excel_row = row_num(r + 1);
        sheet.write_string(excel_row, 0, row.team.as_str())?;
        for (c, count) in row.counts.iter().enumerate() {
            sheet.write_number(excel_row, col_num(c + 1), *count as f64)?;
        }
        sheet.write_number(excel_row, col_num(labels.len()), row.total as f64)?;
    }

    let start = col_num(labels.len()).saturating_add(gap);
    for (c, header) in SUMMARY_COLUMNS.iter().enumerate() {
        sheet.write_string(0, start.saturating_add(col_num(c)), *header)?;
    }
    for (r, row) in report.summary.iter().enumerate() {
        let values = [
            row.sum as f64,
            row.response_pct,
            row.rating,
            f64::from(row.low_rating),
            f64::from(row.low_response),
            row.feedback_requested as f64,
            row.feedback_received as f64,
        ];
        for (c, value) in values.into_iter().enumerate() {
            sheet.write_number(row_num(r + 1), start.saturating_add(col_num(c)), value)?;
        }
    }
    Ok(())
}

// Out-of-range indices saturate and are rejected by the writer.
fn row_num(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

fn col_num(i: usize) -> u16 {
    u16::try_from(i).unwrap_or(u16::MAX)
}

pub fn render_pivot(pivot: &PivotTable) -> String {
    let mut builder = Builder::default();
    let mut header = vec!["Team".to_string()];
    header.extend(pivot.column_labels());
    builder.push_record(header);

    for row in pivot.all_rows() {
        let mut cells = vec![row.team.clone()];
        cells.extend(row.counts.iter().map(|c| c.to_string()));
        cells.push(row.total.to_string());
        builder.push_record(cells);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn render_summary(rows: &[SummaryRow]) -> String {
    Table::new(rows).with(Style::markdown()).to_string()
}

/// Print both tables of a cohort report to the console.
pub fn preview_report(report: &CohortReport) {
    println!("Cohort: {}\n", report.cohort);
    println!("{}\n", render_pivot(&report.pivot));
    println!("{}\n", render_summary(&report.summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::compute_report;
    use crate::types::{Cohort, RatingScale, ReportSettings, ResponseRecord, Thresholds};
    use calamine::{open_workbook, Data, Reader, Xlsx};

    fn sample_report() -> CohortReport {
        let teams: Vec<String> = vec!["Endpoint".to_string(), "Network Services".to_string()];
        let records = vec![
            ResponseRecord::new("Endpoint", "IN", Some(5)),
            ResponseRecord::new("Endpoint", "IN", Some(5)),
            ResponseRecord::new("Endpoint", "IN", None),
            ResponseRecord::new("Network Services", "JP", Some(3)),
        ];
        let settings = ReportSettings {
            scale: RatingScale::new(1, 5),
            thresholds: Thresholds {
                low_rating: 4,
                low_response: 15,
            },
        };
        compute_report(&records, &teams, &Cohort::new("asia", ["IN", "JP"]), &settings)
    }

    fn raw() -> RawTable {
        RawTable {
            rows: vec![
                vec!["CSAT Survey Export".to_string()],
                vec!["Team".to_string(), "IT Center".to_string(), "Survey RatingRest".to_string()],
                vec!["Endpoint".to_string(), "IN".to_string(), "5".to_string()],
                vec!["Endpoint".to_string(), "IN".to_string(), String::new()],
            ],
        }
    }

    fn number(range: &calamine::Range<Data>, row: u32, col: u32) -> f64 {
        match range.get_value((row, col)) {
            Some(Data::Float(f)) => *f,
            Some(Data::Int(i)) => *i as f64,
            other => panic!("expected a number at ({row}, {col}), got {other:?}"),
        }
    }

    fn text(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
        match range.get_value((row, col)) {
            Some(Data::String(s)) => s.clone(),
            other => panic!("expected text at ({row}, {col}), got {other:?}"),
        }
    }

    #[test]
    fn test_workbook_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let report = sample_report();

        write_workbook(&path, &raw(), &[report], &OutputConfig::default()).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["survey", "asia pivot_table"]);

        let survey = workbook.worksheet_range("survey").unwrap();
        assert_eq!(text(&survey, 0, 0), "CSAT Survey Export");
        assert_eq!(text(&survey, 1, 2), "Survey RatingRest");
        assert_eq!(number(&survey, 2, 2), 5.0);
        assert!(matches!(survey.get_value((3, 2)), None | Some(Data::Empty)));

        let sheet = workbook.worksheet_range("asia pivot_table").unwrap();
        // Pivot: Team | 1..5 | Grand Total
        assert_eq!(text(&sheet, 0, 0), "Team");
        assert_eq!(text(&sheet, 0, 1), "1");
        assert_eq!(text(&sheet, 0, 6), "Grand Total");
        assert_eq!(text(&sheet, 1, 0), "Endpoint");
        assert_eq!(number(&sheet, 1, 5), 2.0);
        assert_eq!(number(&sheet, 1, 6), 2.0);
        assert_eq!(text(&sheet, 3, 0), "Grand Total");
        assert_eq!(number(&sheet, 3, 6), 3.0);

        // Summary starts after 6 pivot columns plus a gap of 4.
        assert_eq!(text(&sheet, 0, 10), "SUM");
        assert_eq!(text(&sheet, 0, 16), "Feedback Received");
        assert_eq!(number(&sheet, 1, 10), 10.0);
        assert_eq!(number(&sheet, 1, 11), 66.7);
        assert_eq!(number(&sheet, 1, 12), 5.0);
        assert_eq!(number(&sheet, 1, 13), 4.0);
        assert_eq!(number(&sheet, 1, 14), 15.0);
        assert_eq!(number(&sheet, 1, 15), 1.0);
        assert_eq!(number(&sheet, 1, 16), 2.0);
        assert_eq!(number(&sheet, 3, 10), 13.0);
        assert_eq!(number(&sheet, 3, 12), 4.3);
    }

    #[test]
    fn test_invalid_sheet_name_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let mut report = sample_report();
        report.cohort = "a cohort name far too long for a sheet".to_string();

        let result = write_workbook(&path, &raw(), &[report], &OutputConfig::default());
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_render_tables() {
        let report = sample_report();

        let pivot = render_pivot(&report.pivot);
        assert!(pivot.contains("Grand Total"));
        assert!(pivot.lines().any(|l| l.contains("Network Services")));

        let summary = render_summary(&report.summary);
        assert!(summary.contains("Feedback Requested"));
        assert!(summary.contains("66.7"));
        assert!(summary.contains("5.0"));
    }
}
