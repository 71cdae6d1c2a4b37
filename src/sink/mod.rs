#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Consumers of a finished [`ReportBundle`].
//!
//! Sinks only ever borrow the bundle, so a failing sink cannot alter what the
//! engine produced or what the next sink sees.

use std::path::{Path, PathBuf};

use crate::{check::Category, report::ReportBundle};

/// Terminal summary.
pub mod console;
/// HTTP result publisher.
pub mod publish;
/// Per-category plain-text reports.
pub mod text;
/// XML test-case report.
pub mod xml;

pub use console::ConsoleSink;
pub use publish::{HttpPublisher, PublishPolicy};
pub use text::TextReportSink;
pub use xml::XmlReportSink;

/// Text report for functional checks.
pub const FUNCTIONAL_REPORT: &str = "output_revised.txt";
/// Text report for boundary checks.
pub const BOUNDARY_REPORT: &str = "output_boundary_revised.txt";
/// Text report for exception checks.
pub const EXCEPTION_REPORT: &str = "output_exception_revised.txt";
/// XML report accumulating every case.
pub const XML_REPORT: &str = "yaksha-test-cases.xml";

/// Returns the text report file name for a category.
pub fn report_file_for(category: Category) -> &'static str {
    match category {
        Category::Functional => FUNCTIONAL_REPORT,
        Category::Boundary => BOUNDARY_REPORT,
        Category::Exception => EXCEPTION_REPORT,
    }
}

/// Errors raised while persisting or transmitting a report.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// A report file could not be written or removed.
    #[error("Could not write {}: {source}", .path.display())]
    Io {
        /// File being written.
        path:   PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The request could not be sent or the server rejected it.
    #[error("Could not publish results to {endpoint}: {source}")]
    Http {
        /// Target URL.
        endpoint: String,
        /// Underlying error.
        #[source]
        source:   reqwest::Error,
    },
    /// The payload could not be serialized.
    #[error("Could not serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SinkError {
    /// Wraps an I/O error with the path it concerns.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Something that persists or transmits a finished report.
pub trait Sink {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Consumes the whole bundle. Per-record sinks iterate it in order.
    fn consume(&self, bundle: &ReportBundle) -> Result<(), SinkError>;
}

/// Hands `bundle` to every sink in turn.
///
/// A failing sink is logged and skipped; the remaining sinks still run.
/// Returns the failures so the caller can decide on an exit status.
pub fn dispatch(bundle: &ReportBundle, sinks: &[&dyn Sink]) -> Vec<(String, SinkError)> {
    let mut failures = Vec::new();
    for sink in sinks {
        match sink.consume(bundle) {
            Ok(()) => tracing::debug!("Sink {} done", sink.name()),
            Err(e) => {
                tracing::warn!("Sink {} failed: {}", sink.name(), e);
                failures.push((sink.name().to_string(), e));
            }
        }
    }
    failures
}

/// Deletes report files left over from a previous run in `dir`.
///
/// Returns the paths that were removed.
pub fn remove_stale_reports(dir: &Path) -> Result<Vec<PathBuf>, SinkError> {
    let mut removed = Vec::new();
    for name in [FUNCTIONAL_REPORT, BOUNDARY_REPORT, EXCEPTION_REPORT, XML_REPORT] {
        let path = dir.join(name);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| SinkError::io(&path, e))?;
            tracing::info!("Deleted: {}", path.display());
            removed.push(path);
        }
    }
    Ok(removed)
}

/// Opens `path` for appending, creating it if needed.
pub(crate) fn append_to(path: &Path, contents: &str) -> Result<(), SinkError> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SinkError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| SinkError::io(path, e))
}
