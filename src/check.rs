#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The contract every structural check implements.

use std::fmt::Display;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::tree::SyntaxTree;

/// The report bucket a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Checks that the required behaviour is present.
    Functional,
    /// Checks for edge and limit handling.
    Boundary,
    /// Checks for error handling.
    Exception,
}

impl Category {
    /// Lowercase name, as used on the wire and in file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Functional => "functional",
            Category::Boundary => "boundary",
            Category::Exception => "exception",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a check concluded about one tree.
///
/// A passing outcome never carries feedback and a failing one always does;
/// the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Whether the check passed.
    passed:   bool,
    /// Human-readable reasons, empty iff `passed`.
    feedback: Vec<String>,
}

impl CheckOutcome {
    /// A passing outcome.
    pub fn pass() -> Self {
        Self {
            passed:   true,
            feedback: Vec::new(),
        }
    }

    /// A failing outcome with a single reason.
    ///
    /// A blank reason is replaced the same way [`CheckOutcome::fail_with`]
    /// replaces one.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::fail_with(std::iter::once(reason.into()))
    }

    /// A failing outcome with several reasons.
    ///
    /// Blank reasons are dropped; if nothing is left a generic reason is
    /// used instead.
    pub fn fail_with<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut feedback: Vec<String> = reasons
            .into_iter()
            .map(Into::into)
            .filter(|r| !r.trim().is_empty())
            .collect();
        if feedback.is_empty() {
            feedback.push("Requirement not met.".to_string());
        }
        Self {
            passed: false,
            feedback,
        }
    }

    /// Passes if `cond` holds, otherwise fails with `reason`.
    pub fn require(cond: bool, reason: impl Into<String>) -> Self {
        if cond { Self::pass() } else { Self::fail(reason) }
    }

    /// Whether the check passed.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Reasons for failure, in order.
    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }
}

/// A named, pure structural rule evaluated against a parsed program.
///
/// Implementations must not keep mutable state: the same tree always yields
/// the same outcome. A missing construct is a failing [`CheckOutcome`], not
/// an `Err`; errors are reserved for internal faults and are isolated by the
/// engine.
pub trait Check: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Report bucket.
    fn category(&self) -> Category {
        Category::Functional
    }

    /// Inspects the tree.
    fn evaluate(&self, tree: &SyntaxTree) -> Result<CheckOutcome>;
}

impl std::fmt::Debug for dyn Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name())
            .field("category", &self.category())
            .finish()
    }
}

/// Predicate type backing [`FnCheck`].
type CheckFn = Box<dyn Fn(&SyntaxTree) -> Result<CheckOutcome> + Send + Sync>;

/// A check backed by a closure, for rubrics assembled at runtime and tests.
pub struct FnCheck {
    /// Unique name.
    name:     String,
    /// Report bucket.
    category: Category,
    /// The rule itself.
    func:     CheckFn,
}

impl FnCheck {
    /// Wraps `func` as a functional check named `name`.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&SyntaxTree) -> Result<CheckOutcome> + Send + Sync + 'static,
    {
        Self {
            name:     name.into(),
            category: Category::Functional,
            func:     Box::new(func),
        }
    }

    /// Moves the check to another category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

impl Check for FnCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> Category {
        self.category
    }

    fn evaluate(&self, tree: &SyntaxTree) -> Result<CheckOutcome> {
        (self.func)(tree)
    }
}
