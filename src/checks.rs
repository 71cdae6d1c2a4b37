#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The reference rubric for the "functions" assignment.
//!
//! All four checks look only at top-level functions, and the return check
//! only at statements directly in a function body.

use anyhow::Result;

use crate::{
    check::{Check, CheckOutcome},
    registry::{CheckRegistry, ConfigurationError},
    tree::SyntaxTree,
};

/// Passes if the program declares at least one top-level function.
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionDefinedCheck;

impl Check for FunctionDefinedCheck {
    fn name(&self) -> &str {
        "FunctionDefinition"
    }

    fn evaluate(&self, tree: &SyntaxTree) -> Result<CheckOutcome> {
        tracing::info!("Checking function definition");
        Ok(CheckOutcome::require(
            tree.functions().next().is_some(),
            "You must define a function correctly.",
        ))
    }
}

/// Passes if some top-level function takes at least one parameter.
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionArgumentsUsedCheck;

impl Check for FunctionArgumentsUsedCheck {
    fn name(&self) -> &str {
        "FunctionArgumentsUsage"
    }

    fn evaluate(&self, tree: &SyntaxTree) -> Result<CheckOutcome> {
        tracing::info!("Checking function arguments usage");
        Ok(CheckOutcome::require(
            tree.functions().any(|f| !f.params.is_empty()),
            "You must use function arguments inside your function.",
        ))
    }
}

/// Passes if any parameter of any top-level function has a default value.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultArgumentsUsedCheck;

impl Check for DefaultArgumentsUsedCheck {
    fn name(&self) -> &str {
        "DefaultArgumentsUsage"
    }

    fn evaluate(&self, tree: &SyntaxTree) -> Result<CheckOutcome> {
        tracing::info!("Checking default arguments usage");
        Ok(CheckOutcome::require(
            tree.functions()
                .flat_map(|f| f.params.iter())
                .any(|p| p.is_defaulted()),
            "You must use default arguments in your function.",
        ))
    }
}

/// Passes if some top-level function body directly contains `return`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturnStatementUsedCheck;

impl Check for ReturnStatementUsedCheck {
    fn name(&self) -> &str {
        "ReturnStatementUsage"
    }

    fn evaluate(&self, tree: &SyntaxTree) -> Result<CheckOutcome> {
        tracing::info!("Checking return statement usage");
        Ok(CheckOutcome::require(
            tree.functions().any(|f| f.returns_directly()),
            "You must use the return statement inside your function.",
        ))
    }
}

/// Builds the reference rubric: all four checks, mandatory, one point each.
pub fn reference_rubric() -> Result<CheckRegistry, ConfigurationError> {
    CheckRegistry::builder()
        .register(FunctionDefinedCheck, true, 1.0)
        .register(FunctionArgumentsUsedCheck, true, 1.0)
        .register(DefaultArgumentsUsedCheck, true, 1.0)
        .register(ReturnStatementUsedCheck, true, 1.0)
        .build()
}
