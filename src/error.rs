use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, InvoiceError>;

/// Fatal failures. Any of these aborts the run before an invoice is written.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the user provides a path that does not exist.
    #[error("workbook file {} does not exist", .0.display())]
    MissingInput(PathBuf),

    /// Raised when the workbook has no `META` sheet.
    #[error("timesheet document does not have a {0} sheet")]
    MissingMetadataSheet(String),

    /// Raised when the project name cell is empty.
    #[error("project not defined in metadata")]
    MissingProject,

    /// Raised when a cycle boundary is not a date-time.
    #[error("{field} in timesheet metadata ({value}) cannot be converted to a date-time")]
    InvalidMetadataDate { field: &'static str, value: String },

    /// Raised when at least one pair of time ranges overlaps.
    #[error("terminating due to failed range validation ({0} overlapping range pair(s))")]
    OverlappingRanges(usize),

    /// Raised when an amount on the invoice does not fit in a decimal.
    #[error("cost of {0} is too large to represent")]
    CostOverflow(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
