use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::Result;
use crate::model::{CellRef, CellValue, SheetData, WorkbookData};

/// Seconds in one spreadsheet day serial.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Reads every sheet of an xlsx workbook into memory, preserving sheet order.
pub fn read_workbook(path: &Path) -> Result<WorkbookData> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let Some(range) = workbook.worksheet_range(&name) else {
            continue;
        };
        let sheet = read_sheet(&name, &range?);
        debug!(sheet = %sheet.name, last_row = ?sheet.last_row(), "read worksheet");
        sheets.push(sheet);
    }

    Ok(WorkbookData { sheets })
}

fn read_sheet(name: &str, range: &calamine::Range<DataType>) -> SheetData {
    let mut sheet = SheetData::new(name);
    let Some((first_row, first_col)) = range.start() else {
        return sheet;
    };

    // Range rows are relative to the first used cell; sheet coordinates are absolute.
    for (row_offset, row) in range.rows().enumerate() {
        for (col_offset, cell) in row.iter().enumerate() {
            let position = CellRef::new(first_row + row_offset as u32, first_col + col_offset as u32);
            sheet.set(position, to_cell_value(cell));
        }
    }

    sheet
}

fn to_cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::DateTime(serial) => match serial_to_datetime(*serial) {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Number(*serial),
        },
        DataType::Error(error) => CellValue::Error(error.to_string()),
        other => CellValue::Text(other.to_string()),
    }
}

/// Converts a spreadsheet day serial (days since 1899-12-30, fraction = time
/// of day) into a date-time, rounded to the nearest second.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_map_onto_the_spreadsheet_epoch() {
        let new_year = serial_to_datetime(45292.375).expect("in range");
        assert_eq!(new_year.to_string(), "2024-01-01 09:00:00");

        let bare_midnight = serial_to_datetime(0.0).expect("in range");
        assert_eq!(bare_midnight.to_string(), "1899-12-30 00:00:00");

        assert_eq!(serial_to_datetime(-1.0), None);
        assert_eq!(serial_to_datetime(f64::NAN), None);
    }
}
