use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{CellRef, Metadata, SheetData, TimeRange, Timesheet, WorkbookData};
use crate::parse::metadata::METADATA_SHEET;
use crate::parse::{cell_to_datetime, cell_to_rate, cell_to_time};

const RATE_CELL: CellRef = CellRef::new(1, 7); // H2
const OPENED_CELL: CellRef = CellRef::new(3, 7); // H4
const CLOSED_CELL: CellRef = CellRef::new(4, 7); // H5

const DATE_COL: u32 = 0;
const START_COL: u32 = 1;
const END_COL: u32 = 2;

/// Column B text marking the header row.
const HEADER_MARKER: &str = "Start";
/// Column B text marking the end of the entries.
const TOTALS_MARKER: &str = "Totals";

/// A problem that excludes one item from the invoice.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemIssue {
    #[error("rate {value} of type {kind} cannot be converted to a positive decimal")]
    InvalidRate { value: String, kind: &'static str },

    #[error("open date {value} of type {kind} cannot be parsed as a date")]
    InvalidOpenDate { value: String, kind: &'static str },

    #[error("close date {value} of type {kind} cannot be parsed as a date")]
    InvalidCloseDate { value: String, kind: &'static str },

    #[error("open date {opened} is after close date {closed}")]
    ClosedBeforeOpened {
        opened: NaiveDateTime,
        closed: NaiveDateTime,
    },

    #[error("date {value} in row {row} is not valid")]
    InvalidDate { row: u32, value: String },

    #[error("start time {value} in row {row} is not valid")]
    InvalidStartTime { row: u32, value: String },

    #[error("end time {value} in row {row} is not valid")]
    InvalidEndTime { row: u32, value: String },

    #[error("labor on {date} in row {row} is before open date {opened}")]
    BeforeOpen {
        row: u32,
        date: NaiveDate,
        opened: NaiveDate,
    },

    #[error("labor on {date} in row {row} is after close date {closed}")]
    AfterClose {
        row: u32,
        date: NaiveDate,
        closed: NaiveDate,
    },

    #[error("cost of the item's labor at rate {rate} is too large to represent")]
    CostOverflow { rate: Decimal },
}

/// Result of reading one item sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Accepted(Timesheet),
    /// Rate or open/close dates were unusable, or the item's cost overflows.
    Skipped(ItemIssue),
    /// At least one entry row was rejected. Every rejected row is listed.
    Discarded(Vec<ItemIssue>),
}

impl ItemOutcome {
    pub fn accepted(self) -> Option<Timesheet> {
        match self {
            ItemOutcome::Accepted(timesheet) => Some(timesheet),
            _ => None,
        }
    }
}

/// Parses every item sheet in workbook order and keeps the accepted ones.
pub fn parse_items(workbook: &WorkbookData, metadata: &Metadata) -> Vec<Timesheet> {
    workbook
        .sheets
        .iter()
        .filter(|sheet| sheet.name != METADATA_SHEET)
        .filter_map(|sheet| parse_item(sheet, metadata).accepted())
        .collect()
}

/// Parses a single item sheet.
///
/// Item-level fields are checked first and the first failure skips the item.
/// Entry rows are then read to the end even after a failure, so that every
/// problem is reported before the item is discarded.
pub fn parse_item(sheet: &SheetData, metadata: &Metadata) -> ItemOutcome {
    let item = sheet.name.as_str();
    info!("processing item {item}");

    let header = match parse_header(sheet) {
        Ok(header) => header,
        Err(issue) => {
            warn!(item, "{issue} - skipping item");
            return ItemOutcome::Skipped(issue);
        }
    };

    let mut ranges = Vec::new();
    let mut issues = Vec::new();

    for row in 0..=sheet.last_row().unwrap_or(0) {
        let date_cell = sheet.get(CellRef::new(row, DATE_COL));
        let start_cell = sheet.get(CellRef::new(row, START_COL));
        let end_cell = sheet.get(CellRef::new(row, END_COL));

        match start_cell.as_text() {
            Some(HEADER_MARKER) => continue,
            Some(TOTALS_MARKER) => break,
            _ => {}
        }
        if date_cell.is_blank() {
            continue;
        }

        let row_number = CellRef::new(row, DATE_COL).display_row();
        let row_issues_before = issues.len();

        let date = cell_to_datetime(date_cell);
        if date.is_none() {
            issues.push(ItemIssue::InvalidDate {
                row: row_number,
                value: date_cell.to_string(),
            });
        }
        let start_time = cell_to_time(start_cell);
        if start_time.is_none() {
            issues.push(ItemIssue::InvalidStartTime {
                row: row_number,
                value: start_cell.to_string(),
            });
        }
        let end_time = cell_to_time(end_cell);
        if end_time.is_none() {
            issues.push(ItemIssue::InvalidEndTime {
                row: row_number,
                value: end_cell.to_string(),
            });
        }

        let (Some(date), Some(start_time), Some(end_time)) = (date, start_time, end_time) else {
            for issue in &issues[row_issues_before..] {
                warn!(item, "{issue}");
            }
            continue;
        };

        let start = date.date().and_time(start_time);
        let mut end = date.date().and_time(end_time);
        if end < start {
            // Labor running past midnight ends on the following day.
            end += Duration::days(1);
        }

        if date < metadata.cycle_start {
            warn!(item, row = row_number, "item {item} has labor before cycle start");
        }
        if date > metadata.cycle_end {
            warn!(item, row = row_number, "item {item} has labor after cycle end");
        }

        if date < header.opened {
            let issue = ItemIssue::BeforeOpen {
                row: row_number,
                date: date.date(),
                opened: header.opened.date(),
            };
            warn!(item, "{issue}");
            issues.push(issue);
            continue;
        }
        if let Some(closed) = header.closed.filter(|closed| date > *closed) {
            let issue = ItemIssue::AfterClose {
                row: row_number,
                date: date.date(),
                closed: closed.date(),
            };
            warn!(item, "{issue}");
            issues.push(issue);
            continue;
        }

        ranges.push(TimeRange::new(start, end));
    }

    if !issues.is_empty() {
        warn!(
            item,
            issue_count = issues.len(),
            "skipping item {item} due to range parsing/validation errors"
        );
        return ItemOutcome::Discarded(issues);
    }

    let timesheet = Timesheet {
        item: item.to_string(),
        rate: header.rate,
        opened: header.opened,
        closed: header.closed,
        ranges,
    };
    if timesheet.owed().is_none() {
        let issue = ItemIssue::CostOverflow { rate: header.rate };
        warn!(item, "{issue} - skipping item");
        return ItemOutcome::Skipped(issue);
    }

    info!(item, "read {} ranges for item {item}", timesheet.ranges.len());
    ItemOutcome::Accepted(timesheet)
}

struct ItemHeader {
    rate: Decimal,
    opened: NaiveDateTime,
    closed: Option<NaiveDateTime>,
}

fn parse_header(sheet: &SheetData) -> Result<ItemHeader, ItemIssue> {
    let rate_cell = sheet.get(RATE_CELL);
    let rate = cell_to_rate(rate_cell).ok_or_else(|| ItemIssue::InvalidRate {
        value: rate_cell.to_string(),
        kind: rate_cell.kind(),
    })?;

    let opened_cell = sheet.get(OPENED_CELL);
    let opened = cell_to_datetime(opened_cell).ok_or_else(|| ItemIssue::InvalidOpenDate {
        value: opened_cell.to_string(),
        kind: opened_cell.kind(),
    })?;

    let closed_cell = sheet.get(CLOSED_CELL);
    let closed = if closed_cell.is_blank() {
        None
    } else {
        Some(
            cell_to_datetime(closed_cell).ok_or_else(|| ItemIssue::InvalidCloseDate {
                value: closed_cell.to_string(),
                kind: closed_cell.kind(),
            })?,
        )
    };

    if let Some(closed) = closed.filter(|closed| *closed < opened) {
        return Err(ItemIssue::ClosedBeforeOpened { opened, closed });
    }

    Ok(ItemHeader {
        rate,
        opened,
        closed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    fn metadata() -> Metadata {
        Metadata {
            project: "Acme Corp".into(),
            tracker: None,
            cycle_start: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid"),
            cycle_end: NaiveDate::from_ymd_opt(2024, 1, 31)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid"),
        }
    }

    fn item_sheet(rate: CellValue, opened: &str, closed: Option<&str>) -> SheetData {
        let mut sheet = SheetData::new("101")
            .with(CellRef::new(0, DATE_COL), text("Date"))
            .with(CellRef::new(0, START_COL), text(HEADER_MARKER))
            .with(CellRef::new(0, END_COL), text("End"))
            .with(RATE_CELL, rate)
            .with(OPENED_CELL, text(opened));
        if let Some(closed) = closed {
            sheet.set(CLOSED_CELL, text(closed));
        }
        sheet
    }

    fn entry(sheet: SheetData, row: u32, date: &str, start: &str, end: &str) -> SheetData {
        sheet
            .with(CellRef::new(row, DATE_COL), text(date))
            .with(CellRef::new(row, START_COL), text(start))
            .with(CellRef::new(row, END_COL), text(end))
    }

    #[test]
    fn accepts_valid_rows_until_totals() {
        let sheet = item_sheet(CellValue::Number(25.0), "2024-01-01", None);
        let sheet = entry(sheet, 1, "2024-01-02", "09:00", "11:00");
        let sheet = entry(sheet, 3, "2024-01-03", "13:00", "15:30");
        let sheet = sheet.with(CellRef::new(4, START_COL), text(TOTALS_MARKER));
        let sheet = entry(sheet, 5, "not a date", "x", "y");

        let timesheet = parse_item(&sheet, &metadata())
            .accepted()
            .expect("item accepted");
        assert_eq!(timesheet.item, "101");
        assert_eq!(timesheet.rate, Decimal::from(25));
        assert_eq!(timesheet.ranges.len(), 2);
        assert_eq!(timesheet.ranges[1].to_string(), "01/03/2024: 13:00 - 15:30");
    }

    #[test]
    fn invalid_rate_skips_item() {
        let sheet = item_sheet(text("lots"), "2024-01-01", None);
        assert!(matches!(
            parse_item(&sheet, &metadata()),
            ItemOutcome::Skipped(ItemIssue::InvalidRate { .. })
        ));
    }

    #[test]
    fn rate_too_large_to_cost_skips_item() {
        let sheet = item_sheet(text("79228162514264337593543950335"), "2024-01-01", None);
        let sheet = entry(sheet, 1, "2024-01-02", "09:00", "11:00");
        assert!(matches!(
            parse_item(&sheet, &metadata()),
            ItemOutcome::Skipped(ItemIssue::CostOverflow { .. })
        ));
    }

    #[test]
    fn close_before_open_skips_item() {
        let sheet = item_sheet(CellValue::Number(25.0), "2024-01-10", Some("2024-01-05"));
        let sheet = entry(sheet, 1, "2024-01-06", "09:00", "10:00");
        assert!(matches!(
            parse_item(&sheet, &metadata()),
            ItemOutcome::Skipped(ItemIssue::ClosedBeforeOpened { .. })
        ));
    }

    #[test]
    fn labor_before_open_discards_whole_item() {
        let sheet = item_sheet(CellValue::Number(25.0), "2024-01-10", None);
        let sheet = entry(sheet, 1, "2024-01-09", "09:00", "10:00");
        let sheet = entry(sheet, 2, "2024-01-11", "09:00", "10:00");

        let ItemOutcome::Discarded(issues) = parse_item(&sheet, &metadata()) else {
            panic!("item should be discarded");
        };
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], ItemIssue::BeforeOpen { row: 2, .. }));
    }

    #[test]
    fn every_bad_row_is_reported() {
        let sheet = item_sheet(CellValue::Number(25.0), "2024-01-01", Some("2024-01-20"));
        let sheet = entry(sheet, 1, "yesterday", "09:00", "10:00");
        let sheet = entry(sheet, 2, "2024-01-03", "nine", "10:00");
        let sheet = entry(sheet, 3, "2024-01-25", "09:00", "10:00");

        let ItemOutcome::Discarded(issues) = parse_item(&sheet, &metadata()) else {
            panic!("item should be discarded");
        };
        assert_eq!(issues.len(), 3);
        assert!(matches!(issues[0], ItemIssue::InvalidDate { row: 2, .. }));
        assert!(matches!(issues[1], ItemIssue::InvalidStartTime { row: 3, .. }));
        assert!(matches!(issues[2], ItemIssue::AfterClose { row: 4, .. }));
    }

    #[test]
    fn labor_outside_cycle_is_only_a_warning() {
        let sheet = item_sheet(CellValue::Number(25.0), "2023-12-01", None);
        let sheet = entry(sheet, 1, "2023-12-15", "09:00", "10:00");
        let timesheet = parse_item(&sheet, &metadata())
            .accepted()
            .expect("item accepted");
        assert_eq!(timesheet.ranges.len(), 1);
    }

    #[test]
    fn blank_dates_are_skipped() {
        let sheet = item_sheet(CellValue::Number(25.0), "2024-01-01", None);
        let sheet = sheet.with(CellRef::new(1, START_COL), text("09:00"));
        let sheet = entry(sheet, 2, "2024-01-02", "09:00", "10:00");
        let timesheet = parse_item(&sheet, &metadata())
            .accepted()
            .expect("item accepted");
        assert_eq!(timesheet.ranges.len(), 1);
    }

    #[test]
    fn end_before_start_runs_past_midnight() {
        let sheet = item_sheet(CellValue::Number(10.0), "2024-01-01", None);
        let sheet = entry(sheet, 1, "2024-01-02", "22:00", "00:30");
        let timesheet = parse_item(&sheet, &metadata())
            .accepted()
            .expect("item accepted");
        assert_eq!(timesheet.ranges[0].duration(), Duration::minutes(150));
    }

    #[test]
    fn metadata_sheet_is_not_an_item() {
        let meta = SheetData::new(METADATA_SHEET).with(RATE_CELL, CellValue::Number(1.0));
        let sheet = entry(
            item_sheet(CellValue::Number(25.0), "2024-01-01", None),
            1,
            "2024-01-02",
            "09:00",
            "10:00",
        );
        let workbook = WorkbookData {
            sheets: vec![meta, sheet],
        };
        let items = parse_items(&workbook, &metadata());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item, "101");
    }
}
