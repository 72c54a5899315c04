use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::error::{InvoiceError, Result};
use crate::invoice::Invoice;
use crate::io::{excel_read, markdown};
use crate::parse::item::parse_items;
use crate::parse::metadata::parse_metadata;
use crate::validate::validate_ranges;

/// Where and when the invoice is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceOptions {
    /// Directory the invoice file is written to.
    pub output_dir: PathBuf,
    /// Date stamped into the title and file name.
    pub generated_on: NaiveDate,
}

impl InvoiceOptions {
    /// Current directory, today's local date.
    pub fn today() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            generated_on: chrono::Local::now().date_naive(),
        }
    }
}

/// Reads a timesheet workbook, validates it and writes the invoice.
///
/// Returns the path of the written file. On any fatal problem nothing is
/// written.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output_dir = %options.output_dir.display())
)]
pub fn generate_invoice(input: &Path, options: &InvoiceOptions) -> Result<PathBuf> {
    if !input.is_file() {
        return Err(InvoiceError::MissingInput(input.to_path_buf()));
    }

    info!("loading workbook");
    let workbook = excel_read::read_workbook(input)?;

    info!("parsing metadata");
    let metadata = parse_metadata(&workbook)?;
    info!("found metadata for project {}", metadata.project);

    info!("parsing timesheets");
    let timesheets = parse_items(&workbook, &metadata);

    validate_ranges(&timesheets)?;

    info!("generating invoice");
    let invoice = Invoice::build(&metadata, &timesheets, options.generated_on)?;
    let path = markdown::write_invoice(&options.output_dir, &invoice)?;
    info!("wrote invoice to {}", path.display());
    Ok(path)
}
