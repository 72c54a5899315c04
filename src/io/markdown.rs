use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::invoice::{Invoice, format_cost};

const DATE_FORMAT: &str = "%Y-%m-%d";
const ONGOING: &str = "Ongoing";

/// Renders the invoice as a markdown document.
pub fn render_invoice(invoice: &Invoice) -> String {
    let mut out = format!(
        "# {} Invoice: {}\n\nThis invoice covers labor between {} and {}.\n\n",
        invoice.project,
        invoice.generated_on.format(DATE_FORMAT),
        invoice.cycle_start.format(DATE_FORMAT),
        invoice.cycle_end.format(DATE_FORMAT)
    );
    out.push_str("| Item | Opened | Closed | Cost |\n");
    out.push_str("|---|---|---|---|\n");

    for line in &invoice.lines {
        let item = match &line.tracker_url {
            Some(url) => format!("[{}]({url})", line.item),
            None => line.item.clone(),
        };
        let closed = line
            .closed
            .map(|closed| closed.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| ONGOING.to_string());
        out.push_str(&format!(
            "| {item} | {} | {closed} | {} |\n",
            line.opened.format(DATE_FORMAT),
            format_cost(line.cost)
        ));
    }

    out.push_str(&format!("| **Total** | | | {} |\n", format_cost(invoice.total)));
    out
}

/// Writes the invoice into `dir`, replacing any file of the same name, and
/// returns the path written.
pub fn write_invoice(dir: &Path, invoice: &Invoice) -> Result<PathBuf> {
    let path = dir.join(invoice.file_name());
    let document = render_invoice(invoice);
    debug!(path = %path.display(), bytes = document.len(), "writing invoice");
    fs::write(&path, document)?;
    Ok(path)
}
