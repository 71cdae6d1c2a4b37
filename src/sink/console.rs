#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Terminal summary of a finished report.

use colored::Colorize;

use super::{Sink, SinkError};
use crate::report::ReportBundle;

/// Prints the summary table and one colored line per record to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn consume(&self, bundle: &ReportBundle) -> Result<(), SinkError> {
        eprintln!("{}", bundle.table());
        for record in bundle.records() {
            let line = format!("{}: {}", record.check_name(), record.status());
            if record.passed() {
                eprintln!("{}", line.yellow());
            } else {
                eprintln!("{}", line.red());
            }
        }
        if !bundle.accepted() {
            let failed: Vec<_> = bundle.mandatory_failures().map(|r| r.check_name()).collect();
            eprintln!("{}", format!("Mandatory checks failed: {}", failed.join(", ")).red().bold());
        }
        Ok(())
    }
}
