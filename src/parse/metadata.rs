use tracing::warn;

use crate::error::{InvoiceError, Result};
use crate::model::{CellRef, Metadata, WorkbookData};
use crate::parse::{cell_to_datetime, cell_to_label};

/// Reserved sheet holding project-wide settings.
pub const METADATA_SHEET: &str = "META";

const PROJECT_CELL: CellRef = CellRef::new(0, 1); // B1
const TRACKER_CELL: CellRef = CellRef::new(1, 1); // B2
const CYCLE_START_CELL: CellRef = CellRef::new(2, 1); // B3
const CYCLE_END_CELL: CellRef = CellRef::new(3, 1); // B4

/// Reads the metadata sheet. Every failure here is fatal for the run; a
/// missing tracker template only produces a warning.
pub fn parse_metadata(workbook: &WorkbookData) -> Result<Metadata> {
    let sheet = workbook
        .sheet(METADATA_SHEET)
        .ok_or_else(|| InvoiceError::MissingMetadataSheet(METADATA_SHEET.to_string()))?;

    let project = cell_to_label(sheet.get(PROJECT_CELL)).ok_or(InvoiceError::MissingProject)?;

    let tracker = cell_to_label(sheet.get(TRACKER_CELL));
    if tracker.is_none() {
        warn!("tracker not defined in metadata; items will be listed without links");
    }

    let start_cell = sheet.get(CYCLE_START_CELL);
    let cycle_start =
        cell_to_datetime(start_cell).ok_or_else(|| InvoiceError::InvalidMetadataDate {
            field: "cycle start",
            value: format!("{start_cell} of type {}", start_cell.kind()),
        })?;

    let end_cell = sheet.get(CYCLE_END_CELL);
    let cycle_end = cell_to_datetime(end_cell).ok_or_else(|| InvoiceError::InvalidMetadataDate {
        field: "cycle end",
        value: format!("{end_cell} of type {}", end_cell.kind()),
    })?;

    if cycle_end < cycle_start {
        warn!(%cycle_start, %cycle_end, "billing cycle ends before it starts");
    }

    Ok(Metadata {
        project,
        tracker,
        cycle_start,
        cycle_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, SheetData};

    fn meta_sheet() -> SheetData {
        SheetData::new(METADATA_SHEET)
            .with(PROJECT_CELL, CellValue::Text("Acme Corp".into()))
            .with(
                TRACKER_CELL,
                CellValue::Text("https://tracker.example/%s".into()),
            )
            .with(CYCLE_START_CELL, CellValue::Text("2024-01-01".into()))
            .with(CYCLE_END_CELL, CellValue::Text("2024-01-31".into()))
    }

    fn workbook(sheet: SheetData) -> WorkbookData {
        WorkbookData {
            sheets: vec![sheet],
        }
    }

    #[test]
    fn reads_all_four_fields() {
        let metadata = parse_metadata(&workbook(meta_sheet())).expect("metadata parsed");
        assert_eq!(metadata.project, "Acme Corp");
        assert_eq!(
            metadata.tracker.as_deref(),
            Some("https://tracker.example/%s")
        );
        assert_eq!(metadata.cycle_start.to_string(), "2024-01-01 00:00:00");
        assert_eq!(metadata.cycle_end.to_string(), "2024-01-31 00:00:00");
    }

    #[test]
    fn missing_sheet_is_fatal() {
        let err = parse_metadata(&workbook(SheetData::new("12"))).unwrap_err();
        assert!(matches!(err, InvoiceError::MissingMetadataSheet(_)));
    }

    #[test]
    fn missing_project_is_fatal() {
        let sheet = meta_sheet().with(PROJECT_CELL, CellValue::Empty);
        let err = parse_metadata(&workbook(sheet)).unwrap_err();
        assert!(matches!(err, InvoiceError::MissingProject));
    }

    #[test]
    fn missing_tracker_is_tolerated() {
        let sheet = meta_sheet().with(TRACKER_CELL, CellValue::Empty);
        let metadata = parse_metadata(&workbook(sheet)).expect("metadata parsed");
        assert_eq!(metadata.tracker, None);
    }

    #[test]
    fn non_date_cycle_bounds_are_fatal() {
        let sheet = meta_sheet().with(CYCLE_END_CELL, CellValue::Number(3.0));
        let err = parse_metadata(&workbook(sheet)).unwrap_err();
        assert!(matches!(
            err,
            InvoiceError::InvalidMetadataDate {
                field: "cycle end",
                ..
            }
        ));
    }
}
