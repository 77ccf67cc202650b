use thiserror::Error;

/// Errors raised while reading the survey export or writing the workbook.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column {0:?} not found in header row")]
    MissingColumn(String),

    #[error("invalid rating {value:?} on line {line}")]
    InvalidRating { line: u64, value: String },

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
