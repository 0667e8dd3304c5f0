use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the failures that abort decoding, encoding, or the file
/// adapters around them.
///
/// Recoverable cell defects (a malformed score range, a non-numeric score in
/// lenient mode, a blank separator row) never show up here: they are absorbed
/// by the parsers in [`score`](crate::sitecheck::tools::score) with a documented
/// default.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a metadata date is present but cannot be normalized.
    #[error(
        "invalid date format in '{field}': '{raw}' (expected yyyy-mm-dd or a recognised date)"
    )]
    InvalidDateFormat { field: String, raw: String },

    /// Raised when the workbook has no worksheet or the worksheet has no rows.
    #[error("unreadable sheet: {0}")]
    UnreadableSheet(String),

    /// Raised when a header row is present but lacks a required column label.
    #[error("missing column '{label}' in header row")]
    MissingColumn { label: String },

    /// Raised when the first data row has no category to inherit from.
    #[error("data row {row} has a blank category and no preceding row to inherit from")]
    AmbiguousFirstCategory { row: usize },

    /// Raised in strict mode when an achieved score is not an integer.
    #[error("malformed score '{raw}' in data row {row}")]
    MalformedScore { row: usize, raw: String },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
