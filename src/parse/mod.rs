//! Turns raw sheet cells into validated metadata and timesheets.
//!
//! Cells may arrive either as native spreadsheet values or as text typed by
//! hand; the helpers here accept both.

pub mod item;
pub mod metadata;

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::model::CellValue;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Reads a date or date-time cell. Dates without a time land on midnight.
pub fn cell_to_datetime(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::DateTime(value) => Some(*value),
        CellValue::Text(text) => {
            let text = text.trim();
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .or_else(|| {
                    DATE_FORMATS
                        .iter()
                        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}

/// Reads a clock time from a cell.
///
/// Date-time cells go through [`normalize_time_of_day`], so a time that the
/// reader wrapped in a date is accepted.
pub fn cell_to_time(cell: &CellValue) -> Option<NaiveTime> {
    match cell {
        CellValue::DateTime(value) => Some(normalize_time_of_day(*value)),
        CellValue::Text(text) => {
            let text = text.trim();
            TIME_FORMATS
                .iter()
                .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        }
        _ => None,
    }
}

/// Keeps only the clock component of a date-time.
///
/// Known input quirk: spreadsheet readers have no bare time type, so a
/// time-only cell is delivered as a date-time anchored at the format's epoch
/// (1899-12-30). Midnight is the common case, but any time cell may arrive
/// this way, and a full date-time typed into a time column is treated alike.
pub fn normalize_time_of_day(value: NaiveDateTime) -> NaiveTime {
    value.time()
}

/// Reads an hourly rate. Accepts numeric cells and text such as `$25.00`.
/// Returns `None` unless the rate is strictly positive.
pub fn cell_to_rate(cell: &CellValue) -> Option<Decimal> {
    let rate = match cell {
        CellValue::Number(value) => Decimal::from_f64(*value)?,
        CellValue::Text(text) => {
            let cleaned = text.trim().trim_start_matches('$').replace(',', "");
            Decimal::from_str(cleaned.trim()).ok()?
        }
        _ => return None,
    };
    (rate > Decimal::ZERO).then_some(rate)
}

/// Plain text rendering of a cell for names and labels.
pub fn cell_to_label(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        CellValue::Number(value) => Some(value.to_string()),
        CellValue::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}
