#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! A closed model of a parsed JavaScript program.
//!
//! Only what the checks inspect is modelled: top-level items, and for
//! functions their parameters and the statements directly in their body.
//! Everything else collapses into an `Other` variant carrying the grammar's
//! node kind, for diagnostics.

use serde::Serialize;

/// How a top-level function was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionStyle {
    /// `function name() {}`
    Declaration,
    /// `function* name() {}`
    Generator,
    /// `const name = function () {}`
    Expression,
    /// `const name = () => {}`
    Arrow,
}

/// A single formal parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Param {
    /// `name`
    Plain {
        /// Bound identifier.
        name: String,
    },
    /// `name = value`
    Defaulted {
        /// Source text of the bound pattern.
        name:    String,
        /// Source text of the default value expression.
        default: String,
    },
    /// `...name`
    Rest {
        /// Source text of the bound pattern.
        name: String,
    },
    /// `{ a, b }` or `[a, b]` without a default.
    Destructured {
        /// Source text of the pattern.
        pattern: String,
    },
}

impl Param {
    /// Whether this parameter carries a default value.
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Param::Defaulted { .. })
    }
}

/// A statement found directly inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    /// `return;` or `return value;`
    Return {
        /// Source text of the returned expression, if any.
        value: Option<String>,
    },
    /// Any other statement, by grammar node kind.
    Other {
        /// The tree-sitter node kind.
        kind: String,
    },
}

/// A function bound at the top level of the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDecl {
    /// Name of the function or of the binding it was assigned to.
    pub name:   Option<String>,
    /// How the function was declared.
    pub style:  FunctionStyle,
    /// Formal parameters, in source order.
    pub params: Vec<Param>,
    /// Statements directly inside the body block. Empty for arrow functions
    /// with an expression body.
    pub body:   Vec<Statement>,
    /// 1-based line the declaration starts on.
    pub line:   usize,
}

impl FunctionDecl {
    /// Returns true if the body directly contains a `return` statement.
    pub fn returns_directly(&self) -> bool {
        self.body
            .iter()
            .any(|s| matches!(s, Statement::Return { .. }))
    }
}

/// A top-level item of the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    /// A function declaration in any of the supported styles.
    Function(FunctionDecl),
    /// Any other top-level statement.
    Other {
        /// The tree-sitter node kind.
        kind: String,
    },
}

/// An immutable, parsed submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyntaxTree {
    /// Top-level items, in source order.
    items: Vec<Item>,
}

impl SyntaxTree {
    /// Creates a tree from already-lowered items.
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Enumerates top-level items.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Enumerates top-level function declarations, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            Item::Other { .. } => None,
        })
    }

    /// Whether the program has no top-level items at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(params: Vec<Param>, body: Vec<Statement>) -> Item {
        Item::Function(FunctionDecl {
            name: Some("f".into()),
            style: FunctionStyle::Declaration,
            params,
            body,
            line: 1,
        })
    }

    #[test]
    fn functions_skips_other_items() {
        let tree = SyntaxTree::new(vec![
            Item::Other {
                kind: "expression_statement".into(),
            },
            function(vec![], vec![]),
        ]);

        assert_eq!(tree.items().count(), 2);
        assert_eq!(tree.functions().count(), 1);
    }

    #[test]
    fn returns_directly_ignores_other_statements() {
        let tree = SyntaxTree::new(vec![function(
            vec![],
            vec![Statement::Other {
                kind: "if_statement".into(),
            }],
        )]);
        let f = tree.functions().next().expect("one function");
        assert!(!f.returns_directly());
    }
}
