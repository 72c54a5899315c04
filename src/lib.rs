//! Core library for the timesheet-invoice command line application.
//!
//! A run reads an xlsx workbook of per-item labor ([`io::excel_read`]), turns
//! its cells into metadata and timesheets ([`parse`]), rejects overlapping
//! time ranges ([`validate`]), costs every item ([`invoice`]) and writes a
//! markdown invoice ([`io::markdown`]). [`pipeline`] strings the steps
//! together.

pub mod error;
pub mod invoice;
pub mod io;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod validate;

pub use error::{InvoiceError, Result};
pub use pipeline::{InvoiceOptions, generate_invoice};
