#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Per-check result records and the bundle a grading run produces.

use std::fmt::Display;

use serde::{Deserialize, Serialize, ser::SerializeMap};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use crate::{
    check::{Category, CheckOutcome},
    registry::RegisteredCheck,
};

/// Pass or fail, as reported to downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Full marks.
    Pass,
    /// Zero marks.
    Fail,
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pass => f.write_str("Pass"),
            Status::Fail => f.write_str("Fail"),
        }
    }
}

#[derive(Tabled, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// The graded outcome of one check.
///
/// `status` is `Pass` exactly when `earned_score == max_score`, which is
/// exactly when `feedback` is empty.
pub struct ResultRecord {
    #[tabled(rename = "Check")]
    /// * `check_name`: name of the check that produced this record
    check_name:   String,
    #[tabled(rename = "Category")]
    /// * `category`: report bucket
    category:     Category,
    #[tabled(rename = "Out Of")]
    /// * `max_score`: points available
    max_score:    f64,
    #[tabled(rename = "Score")]
    /// * `earned_score`: either `0` or `max_score`
    earned_score: f64,
    #[tabled(rename = "Status")]
    /// * `status`: pass or fail
    status:       Status,
    #[tabled(rename = "Mandatory")]
    /// * `mandatory`: whether a failure blocks acceptance
    mandatory:    bool,
    #[tabled(rename = "Feedback")]
    /// * `feedback`: failure reasons joined with `", "`
    feedback:     String,
}

impl ResultRecord {
    /// Scores `outcome` using the static metadata of `entry`.
    pub fn from_outcome(entry: &RegisteredCheck, outcome: &CheckOutcome) -> Self {
        let check = entry.check();
        let (earned_score, status) = if outcome.passed() {
            (entry.max_score(), Status::Pass)
        } else {
            (0.0, Status::Fail)
        };

        Self {
            check_name: check.name().to_string(),
            category: check.category(),
            max_score: entry.max_score(),
            earned_score,
            status,
            mandatory: entry.mandatory(),
            feedback: outcome.feedback().join(", "),
        }
    }

    /// A zero-score record for a check that could not be evaluated.
    pub fn internal_failure(entry: &RegisteredCheck, detail: &str) -> Self {
        let name = entry.check().name();
        let outcome = CheckOutcome::fail(format!(
            "Internal error while evaluating check {name}: {detail}"
        ));
        Self::from_outcome(entry, &outcome)
    }

    /// Name of the check that produced this record.
    pub fn check_name(&self) -> &str {
        &self.check_name
    }

    /// Report bucket.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Points available.
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// Points earned.
    pub fn earned_score(&self) -> f64 {
        self.earned_score
    }

    /// Pass or fail.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the record passed.
    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }

    /// Whether a failure blocks acceptance.
    pub fn mandatory(&self) -> bool {
        self.mandatory
    }

    /// Joined failure reasons; empty on a pass.
    pub fn feedback(&self) -> &str {
        &self.feedback
    }
}

/// Everything one grading run produced, in rubric order.
///
/// Keys are stable across runs for the same check, so reports for different
/// submissions can be diffed. Once returned by the engine a bundle is never
/// modified.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportBundle {
    /// `(key, record)` pairs in insertion order.
    results:  Vec<(String, ResultRecord)>,
    /// Opaque pass-through payload from the caller.
    metadata: String,
}

impl ReportBundle {
    /// Creates an empty bundle carrying `metadata`.
    pub(crate) fn new(metadata: impl Into<String>) -> Self {
        Self {
            results:  Vec::new(),
            metadata: metadata.into(),
        }
    }

    /// Appends a record. Keys are unique because registry names are.
    pub(crate) fn push(&mut self, key: String, record: ResultRecord) {
        debug_assert!(self.get(&key).is_none(), "duplicate report key {key}");
        self.results.push((key, record));
    }

    /// Iterates `(key, record)` pairs in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &ResultRecord)> {
        self.results.iter().map(|(k, r)| (k.as_str(), r))
    }

    /// Iterates records in insertion order.
    pub fn records(&self) -> impl ExactSizeIterator<Item = &ResultRecord> {
        self.results.iter().map(|(_, r)| r)
    }

    /// Looks a record up by key.
    pub fn get(&self, key: &str) -> Option<&ResultRecord> {
        self.results
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, r)| r)
    }

    /// Looks a record up by check name.
    pub fn by_check(&self, name: &str) -> Option<&ResultRecord> {
        self.records().find(|r| r.check_name == name)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the bundle holds no records.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The caller's pass-through payload.
    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    /// Total points earned.
    pub fn earned_total(&self) -> f64 {
        self.records().map(ResultRecord::earned_score).sum()
    }

    /// Total points available.
    pub fn max_total(&self) -> f64 {
        self.records().map(ResultRecord::max_score).sum()
    }

    /// Records that failed and are marked mandatory.
    pub fn mandatory_failures(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records().filter(|r| r.mandatory && !r.passed())
    }

    /// Whether the submission is acceptable, i.e. no mandatory check failed.
    pub fn accepted(&self) -> bool {
        self.mandatory_failures().next().is_none()
    }

    /// Serializes the bundle as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Renders the records as a summary table.
    pub fn table(&self) -> String {
        let (grade, out_of) = (self.earned_total(), self.max_total());
        Table::new(self.records())
            .with(Panel::header("Grading Overview"))
            .with(Panel::footer(format!("Total: {grade:.2}/{out_of:.2}")))
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(32).keep_words(true)))
            .with(
                Modify::new(Rows::first())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(
                Modify::new(Rows::last())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(Style::modern())
            .to_string()
    }
}

impl Serialize for ReportBundle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        /// Serializes the ordered pairs as a JSON object.
        struct Results<'a>(&'a [(String, ResultRecord)]);

        impl Serialize for Results<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (key, record) in self.0 {
                    map.serialize_entry(key, record)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("results", &Results(&self.results))?;
        map.serialize_entry("metadata", &self.metadata)?;
        map.end()
    }
}
