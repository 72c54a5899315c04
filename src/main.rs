use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use timesheet_invoice::{InvoiceError, InvoiceOptions, Result, generate_invoice};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        println!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;

    let defaults = InvoiceOptions::today();
    let options = InvoiceOptions {
        output_dir: cli.output_dir.unwrap_or(defaults.output_dir),
        generated_on: cli.date.unwrap_or(defaults.generated_on),
    };

    generate_invoice(&cli.workbook, &options)?;
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| InvoiceError::Logging(err.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Validate a timesheet workbook and write a markdown invoice."
)]
struct Cli {
    /// Workbook containing timesheet data.
    workbook: PathBuf,

    /// Directory to write the invoice to. Defaults to the current directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Generation date (YYYY-MM-DD) used in the title and file name. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}
