use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;

/// Seconds in one billable hour.
const SECONDS_PER_HOUR: i64 = 3600;

/// Typed value of a single spreadsheet cell, detached from the reader that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A cell carrying a date or time format. Bare times arrive anchored at
    /// the spreadsheet epoch (1899-12-30).
    DateTime(NaiveDateTime),
    /// Formula error such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    /// Returns `true` for missing cells and cells holding only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text content, if the cell holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text.trim()),
            _ => None,
        }
    }

    /// Short name of the value kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Text(_) => "text",
            CellValue::Number(_) => "number",
            CellValue::Bool(_) => "boolean",
            CellValue::DateTime(_) => "date-time",
            CellValue::Error(_) => "error",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, "<empty>"),
            CellValue::Text(text) => write!(f, "\"{text}\""),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::DateTime(value) => write!(f, "{value}"),
            CellValue::Error(value) => write!(f, "{value}"),
        }
    }
}

/// Zero-based cell coordinate. Displays in A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// One-based row number as shown by spreadsheet applications.
    pub fn display_row(&self) -> u32 {
        self.row + 1
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut col = self.col + 1;
        while col > 0 {
            let rem = (col - 1) % 26;
            letters.push(char::from(b'A' + rem as u8));
            col = (col - 1) / 26;
        }
        let column: String = letters.into_iter().rev().collect();
        write!(f, "{column}{}", self.row + 1)
    }
}

/// Error returned when an A1 reference such as `H2` is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRefParseError(pub String);

impl fmt::Display for CellRefParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell reference '{}'", self.0)
    }
}

impl std::error::Error for CellRefParseError {}

impl FromStr for CellRef {
    type Err = CellRefParseError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let err = || CellRefParseError(reference.to_string());
        let split = reference
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(err)?;
        let (letters, digits) = reference.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(err());
        }

        let mut col: u32 = 0;
        for letter in letters.chars() {
            let value = letter.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            col = col
                .checked_mul(26)
                .and_then(|c| c.checked_add(value))
                .ok_or_else(err)?;
        }
        let row: u32 = digits.parse().map_err(|_| err())?;
        if row == 0 {
            return Err(err());
        }

        Ok(CellRef::new(row - 1, col - 1))
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Sparse, reader-independent view of one worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetData {
    pub name: String,
    cells: BTreeMap<CellRef, CellValue>,
}

impl SheetData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Stores a value; blank values are not kept.
    pub fn set(&mut self, cell: CellRef, value: CellValue) {
        if matches!(value, CellValue::Empty) {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, value);
        }
    }

    /// Builder form of [`SheetData::set`].
    pub fn with(mut self, cell: CellRef, value: CellValue) -> Self {
        self.set(cell, value);
        self
    }

    /// Returns the value at `cell`, or [`CellValue::Empty`] when nothing is stored.
    pub fn get(&self, cell: CellRef) -> &CellValue {
        self.cells.get(&cell).unwrap_or(&EMPTY_CELL)
    }

    /// Zero-based index of the last row holding any value.
    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().map(|cell| cell.row).max()
    }
}

/// All sheets of a workbook, in workbook order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookData {
    pub sheets: Vec<SheetData>,
}

impl WorkbookData {
    pub fn sheet(&self, name: &str) -> Option<&SheetData> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

/// Project-wide settings read from the metadata sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub project: String,
    /// Issue tracker URL with a placeholder for the item identifier.
    pub tracker: Option<String>,
    pub cycle_start: NaiveDateTime,
    pub cycle_end: NaiveDateTime,
}

impl Metadata {
    /// Builds the tracker link for an item.
    ///
    /// The placeholder may be written `%s`, `{}` or `{item}`; the first one
    /// found is replaced. A template without a placeholder is returned as is.
    pub fn tracker_url(&self, item: &str) -> Option<String> {
        let template = self.tracker.as_deref()?;
        for placeholder in ["%s", "{item}", "{}"] {
            if template.contains(placeholder) {
                return Some(template.replacen(placeholder, item, 1));
            }
        }
        Some(template.to_string())
    }
}

/// Half-open interval of billed labor, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Two ranges overlap when `max(start) < min(end)`. Ranges that only
    /// touch at a boundary do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Cost of this range at an hourly rate, without rounding. `None` when
    /// the amount does not fit in a `Decimal`.
    pub fn cost(&self, rate: Decimal) -> Option<Decimal> {
        Decimal::from(self.duration().num_seconds())
            .checked_mul(rate)?
            .checked_div(Decimal::from(SECONDS_PER_HOUR))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} - {}",
            self.start.format("%m/%d/%Y"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Billed labor for one tracked item.
#[derive(Debug, Clone, PartialEq)]
pub struct Timesheet {
    pub item: String,
    /// Hourly rate; always positive.
    pub rate: Decimal,
    pub opened: NaiveDateTime,
    pub closed: Option<NaiveDateTime>,
    pub ranges: Vec<TimeRange>,
}

impl Timesheet {
    /// Sum of the cost of every range, or `None` on overflow.
    pub fn owed(&self) -> Option<Decimal> {
        self.ranges.iter().try_fold(Decimal::ZERO, |owed, range| {
            owed.checked_add(range.cost(self.rate)?)
        })
    }
}
