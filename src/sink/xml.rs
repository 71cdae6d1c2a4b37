#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! XML test-case report.

use std::path::PathBuf;

use super::{Sink, SinkError, append_to};
use crate::report::{ReportBundle, ResultRecord};

/// Appends one `<test-cases>` document per record to a single file.
#[derive(Debug, Clone)]
pub struct XmlReportSink {
    /// File the documents are appended to.
    path: PathBuf,
}

impl XmlReportSink {
    /// Appends to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Appends the document for one record.
    pub fn append_xml(&self, record: &ResultRecord) -> Result<(), SinkError> {
        append_to(&self.path, &render(record))
    }
}

/// Renders the document for one record.
pub fn render(record: &ResultRecord) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<test-cases>\n  <case>\n    \
         <test-case-type>{}</test-case-type>\n    <name>{}</name>\n    \
         <status>{}</status>\n  </case>\n</test-cases>\n",
        escape(record.category().as_str()),
        escape(record.check_name()),
        record.status(),
    )
}

/// Escapes character data for an XML element body.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

impl Sink for XmlReportSink {
    fn name(&self) -> &str {
        "xml"
    }

    fn consume(&self, bundle: &ReportBundle) -> Result<(), SinkError> {
        for record in bundle.records() {
            self.append_xml(record)?;
        }
        Ok(())
    }
}
