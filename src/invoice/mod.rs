use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{InvoiceError, Result};
use crate::model::{Metadata, Timesheet};

/// One billed item as it appears on the invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub item: String,
    pub tracker_url: Option<String>,
    pub opened: NaiveDate,
    /// `None` while the item is still open.
    pub closed: Option<NaiveDate>,
    /// Unrounded cost.
    pub cost: Decimal,
}

/// Aggregated costs for one billing cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub project: String,
    pub generated_on: NaiveDate,
    pub cycle_start: NaiveDate,
    pub cycle_end: NaiveDate,
    pub lines: Vec<InvoiceLine>,
    /// Unrounded sum of every line.
    pub total: Decimal,
}

impl Invoice {
    /// Costs every timesheet and sums them. Nothing is rounded here; see
    /// [`format_cost`] for display.
    pub fn build(
        metadata: &Metadata,
        timesheets: &[Timesheet],
        generated_on: NaiveDate,
    ) -> Result<Self> {
        let mut lines = Vec::with_capacity(timesheets.len());
        let mut total = Decimal::ZERO;

        for sheet in timesheets {
            let cost = sheet
                .owed()
                .ok_or_else(|| InvoiceError::CostOverflow(format!("item {}", sheet.item)))?;
            total = total
                .checked_add(cost)
                .ok_or_else(|| InvoiceError::CostOverflow("the invoice total".to_string()))?;
            lines.push(InvoiceLine {
                item: sheet.item.clone(),
                tracker_url: metadata.tracker_url(&sheet.item),
                opened: sheet.opened.date(),
                closed: sheet.closed.map(|closed| closed.date()),
                cost,
            });
        }

        Ok(Self {
            project: metadata.project.clone(),
            generated_on,
            cycle_start: metadata.cycle_start.date(),
            cycle_end: metadata.cycle_end.date(),
            lines,
            total,
        })
    }

    /// `<project_slug>_invoice_<YYYYMMDD>.md`
    pub fn file_name(&self) -> String {
        format!(
            "{}_invoice_{}.md",
            project_slug(&self.project),
            self.generated_on.format("%Y%m%d")
        )
    }
}

/// Lower-cases the project name and replaces spaces with underscores.
pub fn project_slug(project: &str) -> String {
    project.to_lowercase().replace(' ', "_")
}

/// Formats an amount as dollars with two decimals, rounding half away from zero.
pub fn format_cost(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    format!("${rounded}")
}
