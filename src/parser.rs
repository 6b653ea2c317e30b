//! Recipe parser/validator: raw tree in, [`Transform`] out.
//!
//! The input has already passed the generic tree syntax; this pass checks
//! it against the statement grammar. Validation is fail-fast: the first
//! violation aborts with a [`ParseError`] carrying a slash-path to the
//! offending raw node (`transform/foreach[1]/sort[2]`), and no partial
//! Transform is ever returned.

use std::fmt;

use crate::ast::{SortSpec, Statement, Transform, When};
use crate::grammar::{self, KeywordDescriptor};
use crate::tree::{self, Node};

/// What went wrong, for programmatic inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Tag outside the statement language
    UnknownStatement,
    /// A leaf-only keyword has children
    ExpectsNoCompound,
    /// A parent-only keyword has no children
    RequiresCompound,
    /// Keyword under a parent that may not contain it
    NotAllowedHere,
    /// Right keyword, wrong position among its siblings
    Misplaced,
    /// A mandatory sub-keyword is absent
    MissingRequired,
    /// A singular sub-keyword appears more than once
    NotSingular,
    /// Missing or blank expression text
    EmptyExpression,
    /// A declared name violates the naming rules
    InvalidIdentifier,
    /// The same parameter is declared twice
    Redeclared,
    /// A comparator expression without exactly two placeholders
    InvalidComparator,
}

/// A validation failure, located by the raw node's slash-path.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub path: String,
    pub message: String,
}

impl ParseError {
    fn new(kind: ParseErrorKind, path: &str, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.message, self.path)
    }
}

impl std::error::Error for ParseError {}

/// Validate a raw recipe tree and build the Transform.
pub fn parse(root: &Node) -> Result<Transform, ParseError> {
    let root_name = root.name();
    if root_name != grammar::TRANSFORM {
        return Err(match grammar::describe(&root_name) {
            Some(_) => ParseError::new(
                ParseErrorKind::NotAllowedHere,
                &root_name,
                format!("'{}' cannot be the recipe root, expected 'transform'", root_name),
            ),
            None => ParseError::new(
                ParseErrorKind::UnknownStatement,
                &root_name,
                format!("unknown statement '{}', expected 'transform'", root_name),
            ),
        });
    }

    let path = grammar::TRANSFORM.to_string();
    if root.is_leaf() {
        return Err(ParseError::new(
            ParseErrorKind::RequiresCompound,
            &path,
            "transform requires a compound body",
        ));
    }

    // Parameter names must be unique among the transform's direct children.
    let mut param_names: Vec<String> = Vec::new();
    for (child, child_path) in indexed_children(root, &path) {
        if child.name() == grammar::PARAM {
            if let Some(name) = child.value() {
                if param_names.contains(&name) {
                    return Err(ParseError::new(
                        ParseErrorKind::Redeclared,
                        &child_path,
                        format!("parameter '{}' is declared more than once", name),
                    ));
                }
                param_names.push(name);
            }
        }
    }

    let mut statements = Vec::new();
    for (child, child_path) in indexed_children(root, &path) {
        statements.push(build_statement(&child, grammar::TRANSFORM, &child_path)?);
    }
    Ok(Transform::new(statements))
}

/// Children paired with their slash-paths. The index is 1-based among
/// same-named siblings, XPath style.
fn indexed_children(node: &Node, path: &str) -> Vec<(Node, String)> {
    let children = node.children();
    let mut seen: Vec<(String, usize)> = Vec::new();
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        let name = child.name();
        let count = match seen.iter_mut().find(|(n, _)| *n == name) {
            Some((_, c)) => {
                *c += 1;
                *c
            }
            None => {
                seen.push((name.clone(), 1));
                1
            }
        };
        let child_path = format!("{}/{}[{}]", path, name, count);
        out.push((child, child_path));
    }
    out
}

fn resolve(node: &Node, path: &str) -> Result<&'static KeywordDescriptor, ParseError> {
    let name = node.name();
    grammar::describe(&name).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::UnknownStatement,
            path,
            format!("unknown statement '{}'", name),
        )
    })
}

fn check_shape(node: &Node, desc: &KeywordDescriptor, path: &str) -> Result<(), ParseError> {
    match desc.leaf {
        Some(true) if !node.is_leaf() => Err(ParseError::new(
            ParseErrorKind::ExpectsNoCompound,
            path,
            format!("'{}' does not take a compound body", desc.tag),
        )),
        Some(false) if node.is_leaf() => Err(ParseError::new(
            ParseErrorKind::RequiresCompound,
            path,
            format!("'{}' requires a compound body", desc.tag),
        )),
        _ => Ok(()),
    }
}

fn check_parent(desc: &KeywordDescriptor, parent: &str, path: &str) -> Result<(), ParseError> {
    if desc.allows_parent(parent) {
        return Ok(());
    }
    Err(ParseError::new(
        ParseErrorKind::NotAllowedHere,
        path,
        format!("'{}' is not allowed inside '{}'", desc.tag, parent),
    ))
}

/// The node's own text as a required expression.
fn expr_text(node: &Node, path: &str) -> Result<String, ParseError> {
    match node.value() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ParseError::new(
            ParseErrorKind::EmptyExpression,
            path,
            format!("'{}' requires a non-empty expression", node.name()),
        )),
    }
}

fn build_statement(node: &Node, parent: &str, path: &str) -> Result<Statement, ParseError> {
    let desc = resolve(node, path)?;
    check_shape(node, desc, path)?;
    check_parent(desc, parent, path)?;

    match desc.tag {
        grammar::NODE => build_node(node, path),
        grammar::COPY => Ok(Statement::Copy {
            select: expr_text(node, path)?,
        }),
        grammar::PRINT => Ok(Statement::Print {
            value: expr_text(node, path)?,
            newline: false,
        }),
        grammar::PRINTLN => Ok(Statement::Print {
            value: expr_text(node, path)?,
            newline: true,
        }),
        grammar::FOREACH => build_foreach(node, path),
        grammar::IF => Ok(Statement::If {
            test: expr_text(node, path)?,
            body: build_body(node, grammar::IF, path)?,
        }),
        grammar::CHOOSE => build_choose(node, path),
        grammar::VARIABLE => {
            let (name, select) = build_binding(node, path)?;
            Ok(Statement::Variable { name, select })
        }
        grammar::PARAM => {
            let (name, select) = build_binding(node, path)?;
            Ok(Statement::Param { name, select })
        }
        // Sub-keywords are consumed by their owning builders; one in
        // statement position means its parent cannot contain it.
        tag => Err(ParseError::new(
            ParseErrorKind::NotAllowedHere,
            path,
            format!("'{}' is not allowed inside '{}'", tag, parent),
        )),
    }
}

fn build_body(node: &Node, parent: &'static str, path: &str) -> Result<Vec<Statement>, ParseError> {
    let mut body = Vec::new();
    for (child, child_path) in indexed_children(node, path) {
        body.push(build_statement(&child, parent, &child_path)?);
    }
    Ok(body)
}

fn build_node(node: &Node, path: &str) -> Result<Statement, ParseError> {
    let name = node.value().unwrap_or_default();
    if name.is_empty() || !tree::is_valid_name(&name) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidIdentifier,
            path,
            format!("'{}' is not a valid node name", name),
        ));
    }

    let mut value = None;
    let mut body = Vec::new();
    for (child, child_path) in indexed_children(node, path) {
        if child.name() == grammar::VALUE {
            let desc = resolve(&child, &child_path)?;
            check_shape(&child, desc, &child_path)?;
            if value.is_some() {
                return Err(ParseError::new(
                    ParseErrorKind::NotSingular,
                    &child_path,
                    "'value' may appear at most once under 'node'",
                ));
            }
            value = Some(expr_text(&child, &child_path)?);
        } else {
            body.push(build_statement(&child, grammar::NODE, &child_path)?);
        }
    }
    Ok(Statement::Node { name, value, body })
}

fn build_foreach(node: &Node, path: &str) -> Result<Statement, ParseError> {
    let select = expr_text(node, path)?;
    let mut sorts = Vec::new();
    let mut body = Vec::new();

    for (child, child_path) in indexed_children(node, path) {
        if child.name() == grammar::SORT {
            if !body.is_empty() {
                return Err(ParseError::new(
                    ParseErrorKind::Misplaced,
                    &child_path,
                    "'sort' must precede all other statements in a 'foreach'",
                ));
            }
            sorts.push(build_sort(&child, &child_path)?);
        } else {
            body.push(build_statement(&child, grammar::FOREACH, &child_path)?);
        }
    }
    Ok(Statement::ForEach { select, sorts, body })
}

fn build_sort(node: &Node, path: &str) -> Result<SortSpec, ParseError> {
    let key = expr_text(node, path)?;
    let mut reverse = None;
    let mut comparator = None;

    for (child, child_path) in indexed_children(node, path) {
        let desc = resolve(&child, &child_path)?;
        check_shape(&child, desc, &child_path)?;
        match desc.tag {
            grammar::REVERSE => {
                if reverse.is_some() {
                    return Err(not_singular(grammar::REVERSE, grammar::SORT, &child_path));
                }
                reverse = Some(expr_text(&child, &child_path)?);
            }
            grammar::COMPARATOR => {
                if comparator.is_some() {
                    return Err(not_singular(grammar::COMPARATOR, grammar::SORT, &child_path));
                }
                let text = expr_text(&child, &child_path)?;
                if text.matches('?').count() != 2 {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidComparator,
                        &child_path,
                        "a comparator expression must contain exactly two '?' placeholders",
                    ));
                }
                comparator = Some(text);
            }
            tag => {
                return Err(ParseError::new(
                    ParseErrorKind::NotAllowedHere,
                    &child_path,
                    format!("'{}' is not allowed inside 'sort'", tag),
                ));
            }
        }
    }
    Ok(SortSpec { key, reverse, comparator })
}

fn build_choose(node: &Node, path: &str) -> Result<Statement, ParseError> {
    let mut whens = Vec::new();
    let mut otherwise: Option<Vec<Statement>> = None;
    let mut otherwise_path = String::new();

    for (child, child_path) in indexed_children(node, path) {
        let desc = resolve(&child, &child_path)?;
        check_shape(&child, desc, &child_path)?;
        match desc.tag {
            grammar::WHEN => {
                if otherwise.is_some() {
                    return Err(ParseError::new(
                        ParseErrorKind::Misplaced,
                        &otherwise_path,
                        "'otherwise' must be the last child of 'choose'",
                    ));
                }
                whens.push(When {
                    test: expr_text(&child, &child_path)?,
                    body: build_body(&child, grammar::WHEN, &child_path)?,
                });
            }
            grammar::OTHERWISE => {
                if otherwise.is_some() {
                    return Err(not_singular(grammar::OTHERWISE, grammar::CHOOSE, &child_path));
                }
                otherwise = Some(build_body(&child, grammar::OTHERWISE, &child_path)?);
                otherwise_path = child_path;
            }
            tag => {
                return Err(ParseError::new(
                    ParseErrorKind::NotAllowedHere,
                    &child_path,
                    format!("'{}' is not allowed inside 'choose'", tag),
                ));
            }
        }
    }

    if whens.is_empty() {
        return Err(ParseError::new(
            ParseErrorKind::MissingRequired,
            path,
            "'choose' requires at least one 'when'",
        ));
    }
    Ok(Statement::Choose { whens, otherwise })
}

/// Shared by `variable` and `param`: the declared name plus the single
/// mandatory `select` expression.
fn build_binding(node: &Node, path: &str) -> Result<(String, String), ParseError> {
    let tag = node.name();
    let name = node.value().unwrap_or_default();
    if name.is_empty() {
        return Err(ParseError::new(
            ParseErrorKind::InvalidIdentifier,
            path,
            format!("'{}' requires a non-empty name", tag),
        ));
    }
    if name.contains(':') {
        return Err(ParseError::new(
            ParseErrorKind::InvalidIdentifier,
            path,
            format!("'{}' is not a valid {} name: ':' is reserved", name, tag),
        ));
    }

    let mut select = None;
    for (child, child_path) in indexed_children(node, path) {
        let desc = resolve(&child, &child_path)?;
        check_shape(&child, desc, &child_path)?;
        if desc.tag != grammar::SELECT {
            return Err(ParseError::new(
                ParseErrorKind::NotAllowedHere,
                &child_path,
                format!("'{}' is not allowed inside '{}'", desc.tag, tag),
            ));
        }
        if select.is_some() {
            return Err(not_singular(grammar::SELECT, &tag, &child_path));
        }
        select = Some(expr_text(&child, &child_path)?);
    }

    match select {
        Some(select) => Ok((name, select)),
        None => Err(ParseError::new(
            ParseErrorKind::MissingRequired,
            path,
            format!("'{}' requires a 'select' expression", tag),
        )),
    }
}

fn not_singular(tag: &str, parent: &str, path: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::NotSingular,
        path,
        format!("'{}' may appear at most once under '{}'", tag, parent),
    )
}
