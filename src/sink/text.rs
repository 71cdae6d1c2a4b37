#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Plain-text `Name=PASS` reports, one file per category.

use std::path::PathBuf;

use super::{Sink, SinkError, append_to, report_file_for};
use crate::report::{ReportBundle, ResultRecord, Status};

/// Appends `Name=PASS` / `Name=FAIL` lines to one file per category.
#[derive(Debug, Clone)]
pub struct TextReportSink {
    /// Directory holding the report files.
    dir: PathBuf,
}

impl TextReportSink {
    /// Writes reports into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Appends one record to its category's file.
    pub fn append_report(&self, record: &ResultRecord) -> Result<(), SinkError> {
        let path = self.dir.join(report_file_for(record.category()));
        append_to(&path, &line_for(record))
    }
}

/// Formats the single line written for a record.
fn line_for(record: &ResultRecord) -> String {
    let status = match record.status() {
        Status::Pass => "PASS",
        Status::Fail => "FAIL",
    };
    format!("{}={}\n", record.check_name(), status)
}

impl Sink for TextReportSink {
    fn name(&self) -> &str {
        "text"
    }

    fn consume(&self, bundle: &ReportBundle) -> Result<(), SinkError> {
        for record in bundle.records() {
            self.append_report(record)?;
        }
        Ok(())
    }
}
