#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Tree-sitter parser wrapper for JavaScript source code, and the lowering of
//! its concrete tree into [`SyntaxTree`].

use std::fmt::Formatter;

use anyhow::{Context, Result, anyhow};
use tree_sitter::{Language, Node, Tree};

use crate::tree::{FunctionDecl, FunctionStyle, Item, Param, Statement, SyntaxTree};

/// Errors raised when a submission cannot be turned into a [`SyntaxTree`].
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// The grammar reported a syntax error.
    #[error("Syntax error at line {line}, column {column}: unexpected `{snippet}`")]
    Syntax {
        /// 1-based line of the first error node.
        line:    usize,
        /// 1-based column of the first error node.
        column:  usize,
        /// Source text of the offending node, truncated.
        snippet: String,
    },
    /// Tree-sitter itself failed.
    #[error("Parser failure: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A struct that wraps a tree-sitter parser object and source code.
#[derive(Clone)]
pub struct Parser {
    /// The source code being parsed.
    code: String,
    /// The parse tree.
    tree: Tree,
}

/// Returns the compiled tree-sitter JavaScript language.
fn javascript_language() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("bytes", &self.code.len())
            .finish()
    }
}

impl Parser {
    /// Returns a new parser object.
    ///
    /// * `source_code`: the source code to be parsed
    pub fn new(source_code: String) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        let language = javascript_language();

        parser
            .set_language(&language)
            .with_context(|| "Failed to load JavaScript grammar")?;
        let tree = parser
            .parse(source_code.as_str(), None)
            .ok_or_else(|| anyhow!("Error parsing JavaScript code"))?;

        Ok(Self {
            code: source_code,
            tree,
        })
    }

    /// Returns the parse tree's root node.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Returns the first error or missing node, if the source did not parse
    /// cleanly.
    fn first_error(&self) -> Option<Node<'_>> {
        let root = self.root_node();
        if !root.has_error() {
            return None;
        }

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                return Some(node);
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            // Reverse so the leftmost child is visited first.
            stack.extend(children.into_iter().rev().filter(|c| c.has_error()));
        }
        Some(root)
    }

    /// Lowers the concrete tree into a [`SyntaxTree`].
    ///
    /// Fails with [`ParseError::Syntax`] if the grammar reported any error,
    /// so the checks never see a partially recovered program.
    pub fn syntax_tree(&self) -> Result<SyntaxTree, ParseError> {
        if let Some(node) = self.first_error() {
            let pos = node.start_position();
            let snippet: String = self.text(node)?.chars().take(40).collect();
            return Err(ParseError::Syntax {
                line: pos.row + 1,
                column: pos.column + 1,
                snippet,
            });
        }

        let root = self.root_node();
        let mut cursor = root.walk();
        let mut items = Vec::new();
        for child in root.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            items.extend(self.lower_item(child)?);
        }

        Ok(SyntaxTree::new(items))
    }

    /// Source text covered by `node`.
    fn text(&self, node: Node<'_>) -> Result<&str> {
        node.utf8_text(self.code.as_bytes())
            .with_context(|| format!("Cannot map {} node to source text", node.kind()))
    }

    /// Lowers one top-level statement.
    ///
    /// A declaration binding several functions yields one item per function.
    fn lower_item(&self, node: Node<'_>) -> Result<Vec<Item>> {
        let functions = match node.kind() {
            "function_declaration" => {
                vec![self.lower_function(node, None, FunctionStyle::Declaration)?]
            }
            "generator_function_declaration" => {
                vec![self.lower_function(node, None, FunctionStyle::Generator)?]
            }
            "lexical_declaration" | "variable_declaration" => self.lower_bindings(node)?,
            "export_statement" => {
                return match node.child_by_field_name("declaration") {
                    Some(decl) => self.lower_item(decl),
                    None => Ok(vec![other(node)]),
                };
            }
            _ => Vec::new(),
        };

        if functions.is_empty() {
            return Ok(vec![other(node)]);
        }
        Ok(functions.into_iter().map(Item::Function).collect())
    }

    /// Lowers every declarator of `const a = function () {}, b = () => {}`
    /// that is bound to a function. Other declarators are skipped.
    fn lower_bindings(&self, node: Node<'_>) -> Result<Vec<FunctionDecl>> {
        let mut cursor = node.walk();
        let mut functions = Vec::new();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(value) = declarator.child_by_field_name("value") else {
                continue;
            };
            let style = match value.kind() {
                "function_expression" | "function" => FunctionStyle::Expression,
                "generator_function" => FunctionStyle::Generator,
                "arrow_function" => FunctionStyle::Arrow,
                _ => continue,
            };
            let name = declarator
                .child_by_field_name("name")
                .map(|n| self.text(n).map(str::to_owned))
                .transpose()?;
            functions.push(self.lower_function(value, name, style)?);
        }
        Ok(functions)
    }

    /// Lowers any function-shaped node.
    fn lower_function(
        &self,
        node: Node<'_>,
        binding: Option<String>,
        style: FunctionStyle,
    ) -> Result<FunctionDecl> {
        let name = match node.child_by_field_name("name") {
            Some(n) => Some(self.text(n)?.to_owned()),
            None => binding,
        };

        let params = if let Some(list) = node.child_by_field_name("parameters") {
            let mut cursor = list.walk();
            list.named_children(&mut cursor)
                .filter(|p| p.kind() != "comment")
                .map(|p| self.lower_param(p))
                .collect::<Result<Vec<_>>>()?
        } else if let Some(single) = node.child_by_field_name("parameter") {
            // `x => ...` has a bare identifier instead of a parameter list.
            vec![self.lower_param(single)?]
        } else {
            Vec::new()
        };

        let body = match node.child_by_field_name("body") {
            Some(block) if block.kind() == "statement_block" => {
                let mut cursor = block.walk();
                block
                    .named_children(&mut cursor)
                    .filter(|s| s.kind() != "comment")
                    .map(|s| self.lower_statement(s))
                    .collect::<Result<Vec<_>>>()?
            }
            _ => Vec::new(),
        };

        Ok(FunctionDecl {
            name,
            style,
            params,
            body,
            line: node.start_position().row + 1,
        })
    }

    /// Lowers one formal parameter.
    fn lower_param(&self, node: Node<'_>) -> Result<Param> {
        let text = self.text(node)?.to_owned();
        let param = match node.kind() {
            "assignment_pattern" => {
                let left = node
                    .child_by_field_name("left")
                    .context("Default parameter without a binding")?;
                let right = node
                    .child_by_field_name("right")
                    .context("Default parameter without a value")?;
                Param::Defaulted {
                    name:    self.text(left)?.to_owned(),
                    default: self.text(right)?.to_owned(),
                }
            }
            "rest_pattern" => Param::Rest {
                name: text.trim_start_matches("...").to_owned(),
            },
            "object_pattern" | "array_pattern" => Param::Destructured { pattern: text },
            _ => Param::Plain { name: text },
        };
        Ok(param)
    }

    /// Lowers one statement directly inside a function body.
    fn lower_statement(&self, node: Node<'_>) -> Result<Statement> {
        if node.kind() != "return_statement" {
            return Ok(Statement::Other {
                kind: node.kind().to_owned(),
            });
        }

        let mut cursor = node.walk();
        let value = node
            .named_children(&mut cursor)
            .find(|c| c.kind() != "comment")
            .map(|c| self.text(c).map(str::to_owned))
            .transpose()?;
        Ok(Statement::Return { value })
    }

    /// Returns the total number of lines in the source code.
    pub fn line_count(&self) -> usize {
        self.code.lines().count()
    }
}

/// Wraps a node the checks do not care about.
fn other(node: Node<'_>) -> Item {
    Item::Other {
        kind: node.kind().to_owned(),
    }
}

/// Parses `source` straight into a [`SyntaxTree`].
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    Parser::new(source.to_owned())?.syntax_tree()
}
