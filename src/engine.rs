#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Runs a rubric against a parsed submission.

use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
};

use crate::{
    registry::{CheckRegistry, RegisteredCheck, key_slug},
    report::{ReportBundle, ResultRecord},
    tree::SyntaxTree,
};

/// Runs every check of a registry against one tree.
///
/// The engine is a plain sequential fold: no clock, no randomness, no
/// shared state, so the same inputs always produce the same bundle.
#[derive(Debug, Clone)]
pub struct GradingEngine {
    /// Assignment-level identifier every report key is derived from.
    base_id: String,
}

impl GradingEngine {
    /// Creates an engine whose report keys start with `base_id`.
    pub fn new(base_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
        }
    }

    /// Report key for a check, `"{base_id}-{kebab-case name}"`.
    pub fn key_for(&self, check_name: &str) -> String {
        format!("{}-{}", self.base_id, key_slug(check_name))
    }

    /// Grades `tree` against `registry`.
    ///
    /// Always yields exactly one record per registered check. A check that
    /// errors or panics is recorded as a failure and the run continues.
    pub fn run(
        &self,
        tree: &SyntaxTree,
        registry: &CheckRegistry,
        metadata: impl Into<String>,
    ) -> ReportBundle {
        let mut bundle = ReportBundle::new(metadata);

        for entry in registry.iter() {
            let record = self.evaluate_one(tree, entry);
            tracing::debug!(
                "{}: {} ({}/{})",
                record.check_name(),
                record.status(),
                record.earned_score(),
                record.max_score()
            );
            bundle.push(self.key_for(record.check_name()), record);
        }

        bundle
    }

    /// Evaluates a single check, isolating errors and panics.
    fn evaluate_one(&self, tree: &SyntaxTree, entry: &RegisteredCheck) -> ResultRecord {
        let check = entry.check();
        match catch_unwind(AssertUnwindSafe(|| check.evaluate(tree))) {
            Ok(Ok(outcome)) => ResultRecord::from_outcome(entry, &outcome),
            Ok(Err(err)) => {
                tracing::warn!("Check {} failed to evaluate: {:#}", check.name(), err);
                ResultRecord::internal_failure(entry, &format!("{err:#}"))
            }
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                tracing::warn!("Check {} panicked: {}", check.name(), detail);
                ResultRecord::internal_failure(entry, &detail)
            }
        }
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked".to_string()
    }
}
