//! Pairwise overlap checks over every parsed time range.
//!
//! Timesheets are small, so every pair is compared directly.

use tracing::{error, info};

use crate::error::{InvoiceError, Result};
use crate::model::{TimeRange, Timesheet};

/// Two ranges that claim the same wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    pub first_item: String,
    pub first: TimeRange,
    pub second_item: String,
    pub second: TimeRange,
}

impl Overlap {
    pub fn is_within_item(&self) -> bool {
        self.first_item == self.second_item
    }
}

/// Lists every overlapping pair: first within each item, then across each
/// unordered pair of distinct items.
pub fn find_overlaps(timesheets: &[Timesheet]) -> Vec<Overlap> {
    let mut overlaps = Vec::new();

    for sheet in timesheets {
        for (index, first) in sheet.ranges.iter().enumerate() {
            for second in &sheet.ranges[index + 1..] {
                if first.overlaps(second) {
                    overlaps.push(Overlap {
                        first_item: sheet.item.clone(),
                        first: *first,
                        second_item: sheet.item.clone(),
                        second: *second,
                    });
                }
            }
        }
    }

    for (index, lhs) in timesheets.iter().enumerate() {
        for rhs in &timesheets[index + 1..] {
            for first in &lhs.ranges {
                for second in &rhs.ranges {
                    if first.overlaps(second) {
                        overlaps.push(Overlap {
                            first_item: lhs.item.clone(),
                            first: *first,
                            second_item: rhs.item.clone(),
                            second: *second,
                        });
                    }
                }
            }
        }
    }

    overlaps
}

/// Reports every overlap and fails if there was at least one.
pub fn validate_ranges(timesheets: &[Timesheet]) -> Result<()> {
    info!("validating time ranges");
    let overlaps = find_overlaps(timesheets);

    for overlap in &overlaps {
        if overlap.is_within_item() {
            error!(
                "found overlap within item {}:\n    {}\n    {}",
                overlap.first_item, overlap.first, overlap.second
            );
        } else {
            error!(
                "found overlap between items {} and {}:\n    {}\n    {}",
                overlap.first_item, overlap.second_item, overlap.first, overlap.second
            );
        }
    }

    if !overlaps.is_empty() {
        return Err(InvoiceError::OverlappingRanges(overlaps.len()));
    }

    info!("all time ranges validated");
    Ok(())
}
