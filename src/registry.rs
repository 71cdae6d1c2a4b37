#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The ordered rubric of checks for one assignment.

use bon::Builder;
use itertools::Itertools;

use crate::check::Check;

/// Errors in how a rubric was put together. These are programming or
/// deployment mistakes, so callers should abort rather than grade.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Two checks share a name, so their report keys would collide.
    #[error("Check name `{0}` is registered more than once.")]
    DuplicateName(String),
    /// A check has an empty or whitespace-only name.
    #[error("Check at position {0} has an empty name.")]
    EmptyName(usize),
    /// A check's maximum score is not a positive finite number.
    #[error("Check `{name}` has an invalid maximum score: {max_score}")]
    InvalidMaxScore {
        /// Offending check.
        name:      String,
        /// Value it was registered with.
        max_score: f64,
    },
    /// The rubric has no checks.
    #[error("No checks were added to the registry.")]
    Empty,
}

/// Kebab-cases a check name for use in report keys, e.g.
/// `FunctionArgumentsUsage` becomes `function-arguments-usage`.
pub fn key_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && prev_lower {
                slug.push('-');
            }
            slug.extend(c.to_lowercase());
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        } else {
            if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
            prev_lower = false;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// A check together with its grading metadata.
#[derive(Debug, Builder)]
pub struct RegisteredCheck {
    /// The rule.
    check:     Box<dyn Check>,
    /// Whether failing this check should block acceptance.
    #[builder(default = true)]
    mandatory: bool,
    /// Points awarded on a pass.
    #[builder(default = 1.0)]
    max_score: f64,
}

impl RegisteredCheck {
    /// The rule.
    pub fn check(&self) -> &dyn Check {
        self.check.as_ref()
    }

    /// Whether failing this check should block acceptance.
    pub fn mandatory(&self) -> bool {
        self.mandatory
    }

    /// Points awarded on a pass.
    pub fn max_score(&self) -> f64 {
        self.max_score
    }
}

/// An ordered, validated sequence of checks. Order is report order.
#[derive(Debug)]
pub struct CheckRegistry {
    /// Registered checks, in registration order.
    entries: Vec<RegisteredCheck>,
}

impl CheckRegistry {
    /// Starts an empty registry.
    pub fn builder() -> CheckRegistryBuilder {
        CheckRegistryBuilder::default()
    }

    /// Iterates registered checks in order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredCheck> {
        self.entries.iter()
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no checks are registered. Never true for a built registry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every check's maximum score.
    pub fn max_total(&self) -> f64 {
        self.entries.iter().map(RegisteredCheck::max_score).sum()
    }
}

/// Accumulates checks and validates them in [`CheckRegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct CheckRegistryBuilder {
    /// Checks added so far.
    entries: Vec<RegisteredCheck>,
}

impl CheckRegistryBuilder {
    /// Appends a check.
    pub fn register<C>(mut self, check: C, mandatory: bool, max_score: f64) -> Self
    where
        C: Check + 'static,
    {
        self.entries.push(
            RegisteredCheck::builder()
                .check(Box::new(check))
                .mandatory(mandatory)
                .max_score(max_score)
                .build(),
        );
        self
    }

    /// Appends an already-assembled entry.
    pub fn entry(mut self, entry: RegisteredCheck) -> Self {
        self.entries.push(entry);
        self
    }

    /// Validates names and scores and freezes the registry.
    pub fn build(self) -> Result<CheckRegistry, ConfigurationError> {
        if self.entries.is_empty() {
            return Err(ConfigurationError::Empty);
        }

        for (idx, entry) in self.entries.iter().enumerate() {
            let name = entry.check.name();
            if name.trim().is_empty() {
                return Err(ConfigurationError::EmptyName(idx));
            }
            if !entry.max_score.is_finite() || entry.max_score <= 0.0 {
                return Err(ConfigurationError::InvalidMaxScore {
                    name:      name.to_string(),
                    max_score: entry.max_score,
                });
            }
        }

        // Names that differ only in case or punctuation would share a report key.
        if let Some(dup) = self
            .entries
            .iter()
            .map(|e| e.check.name())
            .duplicates_by(|name| key_slug(name))
            .next()
        {
            return Err(ConfigurationError::DuplicateName(dup.to_string()));
        }

        Ok(CheckRegistry {
            entries: self.entries,
        })
    }
}
