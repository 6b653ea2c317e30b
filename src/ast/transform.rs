//! The [`Transform`] root and AST serialization.
//!
//! A `Transform` serializes back to the raw tree form it was parsed
//! from; parsing the serialization yields a structurally equal
//! `Transform`. This keeps recipes printable and diffable after
//! validation.

use crate::ast::statements::{SortSpec, Statement, When};
use crate::grammar;
use crate::output;
use crate::tree::Node;

/// A validated recipe: the ordered top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub statements: Vec<Statement>,
}

impl Transform {
    pub fn new(statements: Vec<Statement>) -> Self {
        Transform { statements }
    }

    /// Serialize back to the raw tree form.
    pub fn to_tree(&self) -> Node {
        let root = Node::new(grammar::TRANSFORM);
        for stmt in &self.statements {
            root.append(statement_to_tree(stmt));
        }
        root
    }

    /// Serialize to recipe text (pretty-printed).
    pub fn to_recipe(&self) -> String {
        output::to_text_pretty(&self.to_tree())
    }
}

fn statement_to_tree(stmt: &Statement) -> Node {
    match stmt {
        Statement::Node { name, value, body } => {
            let node = Node::with_value(grammar::NODE, name.clone());
            if let Some(expr) = value {
                node.append(Node::with_value(grammar::VALUE, expr.clone()));
            }
            for child in body {
                node.append(statement_to_tree(child));
            }
            node
        }
        Statement::Copy { select } => Node::with_value(grammar::COPY, select.clone()),
        Statement::Print { value, newline } => {
            let tag = if *newline { grammar::PRINTLN } else { grammar::PRINT };
            Node::with_value(tag, value.clone())
        }
        Statement::ForEach { select, sorts, body } => {
            let node = Node::with_value(grammar::FOREACH, select.clone());
            for sort in sorts {
                node.append(sort_to_tree(sort));
            }
            for child in body {
                node.append(statement_to_tree(child));
            }
            node
        }
        Statement::Sort(spec) => sort_to_tree(spec),
        Statement::If { test, body } => {
            let node = Node::with_value(grammar::IF, test.clone());
            for child in body {
                node.append(statement_to_tree(child));
            }
            node
        }
        Statement::Choose { whens, otherwise } => {
            let node = Node::new(grammar::CHOOSE);
            for when in whens {
                node.append(when_to_tree(when));
            }
            if let Some(body) = otherwise {
                let other = Node::new(grammar::OTHERWISE);
                for child in body {
                    other.append(statement_to_tree(child));
                }
                node.append(other);
            }
            node
        }
        Statement::Variable { name, select } => binding_to_tree(grammar::VARIABLE, name, select),
        Statement::Param { name, select } => binding_to_tree(grammar::PARAM, name, select),
    }
}

fn sort_to_tree(spec: &SortSpec) -> Node {
    let node = Node::with_value(grammar::SORT, spec.key.clone());
    if let Some(expr) = &spec.reverse {
        node.append(Node::with_value(grammar::REVERSE, expr.clone()));
    }
    if let Some(expr) = &spec.comparator {
        node.append(Node::with_value(grammar::COMPARATOR, expr.clone()));
    }
    node
}

fn when_to_tree(when: &When) -> Node {
    let node = Node::with_value(grammar::WHEN, when.test.clone());
    for child in &when.body {
        node.append(statement_to_tree(child));
    }
    node
}

fn binding_to_tree(tag: &str, name: &str, select: &str) -> Node {
    let node = Node::with_value(tag, name);
    node.append(Node::with_value(grammar::SELECT, select));
    node
}
