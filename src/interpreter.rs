//! The statement interpreter.
//!
//! Executes a validated [`Transform`] against an execution environment,
//! producing at most one output node. Evaluation is a single-threaded,
//! depth-first recursive walk; every statement's expression is compiled
//! at its evaluation site through the environment's query engine, and any
//! failure aborts the whole execution with a [`TransformError`] naming
//! the failing statement.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use crate::ast::{SortSpec, Statement, Transform};
use crate::path::PathEngine;
use crate::query::{CompiledQuery, QueryContext, QueryEngine, QueryError};
use crate::scope::StatementContext;
use crate::tree::Node;
use crate::value::Value;

/// The execution environment: output sink, parameter overrides, query
/// engine, and the optional source document.
///
/// # Examples
///
/// ```
/// use sprig_lang::interpreter::TransformContext;
/// use sprig_lang::tree;
///
/// let source = tree::read_str("doc { item \"a\" }").unwrap();
/// let ctx = TransformContext::new()
///     .with_source(source)
///     .with_param("minimum", 2.0)
///     .with_sink(Vec::<u8>::new());
/// ```
pub struct TransformContext {
    sink: RefCell<Box<dyn Write>>,
    params: HashMap<String, Value>,
    engine: Box<dyn QueryEngine>,
    source: Option<Node>,
}

impl TransformContext {
    /// An environment writing to stdout, with no overrides, the default
    /// path engine, and no source document.
    pub fn new() -> Self {
        TransformContext {
            sink: RefCell::new(Box::new(io::stdout())),
            params: HashMap::new(),
            engine: Box::new(PathEngine::new()),
            source: None,
        }
    }

    pub fn with_sink(self, sink: impl Write + 'static) -> Self {
        TransformContext {
            sink: RefCell::new(Box::new(sink)),
            ..self
        }
    }

    /// Override a parameter; wins over the `param` statement's own
    /// `select` default.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_engine(mut self, engine: impl QueryEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// The source document; becomes the root scope's context node.
    pub fn with_source(mut self, source: Node) -> Self {
        self.source = Some(source);
        self
    }
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised during execution.
#[derive(Debug)]
pub enum TransformError {
    /// The transform produced more than one root-level output node
    MultipleRoots { name: String },

    /// A `param` executed against a scope that already binds its name
    ParameterReassigned { name: String },

    /// A query expression failed to compile or evaluate
    Query {
        statement: &'static str,
        cause: QueryError,
    },

    /// The sink rejected a write
    Io {
        statement: &'static str,
        cause: io::Error,
    },

    /// Any other per-statement failure
    Statement {
        statement: &'static str,
        message: String,
    },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::MultipleRoots { name } => {
                write!(f, "transform produced more than one root node ('{}' is the second)", name)
            }
            TransformError::ParameterReassigned { name } => {
                write!(f, "parameter '{}' is already bound", name)
            }
            TransformError::Query { statement, cause } => {
                write!(f, "'{}' failed: {}", statement, cause)
            }
            TransformError::Io { statement, cause } => {
                write!(f, "'{}' could not write to the sink: {}", statement, cause)
            }
            TransformError::Statement { statement, message } => {
                write!(f, "'{}' failed: {}", statement, message)
            }
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransformError::Query { cause, .. } => Some(cause),
            TransformError::Io { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Execute a transform, returning its single output node if it produced
/// one.
pub fn execute(
    transform: &Transform,
    ctx: &TransformContext,
) -> Result<Option<Node>, TransformError> {
    let output_root = Node::new("#output");
    let scope = StatementContext::root(output_root.clone(), ctx.source.clone());

    for stmt in &transform.statements {
        execute_statement(stmt, &scope, ctx)?;
    }

    let mut roots = output_root.take_children();
    match roots.len() {
        0 => Ok(None),
        1 => Ok(Some(roots.remove(0))),
        _ => Err(TransformError::MultipleRoots {
            name: roots[1].name(),
        }),
    }
}

fn execute_statement(
    stmt: &Statement,
    scope: &StatementContext,
    ctx: &TransformContext,
) -> Result<(), TransformError> {
    match stmt {
        Statement::Node { name, value, body } => {
            let text = match value {
                Some(expr) => Some(eval_string(expr, scope, ctx, stmt.tag())?),
                None => None,
            };
            let created = Node::new(name.clone());
            created.set_value(text);
            scope.output_node().append(created.clone());

            if !body.is_empty() {
                // Output nesting mirrors statement nesting: the body
                // attaches to the node just constructed.
                let child = scope.child_with_output(created);
                for inner in body {
                    execute_statement(inner, &child, ctx)?;
                }
            }
            Ok(())
        }

        Statement::Copy { select } => {
            let result = eval_value(select, scope, ctx, stmt.tag())?;
            if let Some(nodes) = result.as_nodes() {
                let output = scope.output_node();
                for node in nodes {
                    output.append(node.deep_clone());
                }
            }
            // Non-node results are a deliberate no-op
            Ok(())
        }

        Statement::Print { value, newline } => {
            let text = eval_string(value, scope, ctx, stmt.tag())?;
            let io_err = |cause| TransformError::Io {
                statement: stmt.tag(),
                cause,
            };
            let mut sink = ctx.sink.borrow_mut();
            sink.write_all(text.as_bytes()).map_err(io_err)?;
            if *newline {
                sink.write_all(b"\n").map_err(io_err)?;
            }
            sink.flush().map_err(io_err)
        }

        Statement::ForEach { select, sorts, body } => {
            let selected = eval_value(select, scope, ctx, stmt.tag())?;
            let Some(mut items) = selected.as_nodes() else {
                return Ok(());
            };
            if items.is_empty() {
                return Ok(());
            }
            if !sorts.is_empty() {
                items = sort_items(items, sorts, scope, ctx)?;
            }

            let loop_scope = scope.child();
            loop_scope.bind("last", Value::Num(items.len() as f64));
            for (index, item) in items.iter().enumerate() {
                loop_scope.set_context_node(item.clone());
                loop_scope.bind("current", Value::Node(item.clone()));
                loop_scope.bind("position", Value::Num((index + 1) as f64));
                for inner in body {
                    execute_statement(inner, &loop_scope, ctx)?;
                }
            }
            Ok(())
        }

        // A sort reached by the walk has already been consumed by its
        // owning foreach, or was constructed by hand; either way, inert.
        Statement::Sort(_) => Ok(()),

        Statement::If { test, body } => {
            if eval_bool(test, scope, ctx, stmt.tag())? {
                let child = scope.child();
                for inner in body {
                    execute_statement(inner, &child, ctx)?;
                }
            }
            Ok(())
        }

        Statement::Choose { whens, otherwise } => {
            for when in whens {
                if eval_bool(&when.test, scope, ctx, "when")? {
                    let child = scope.child();
                    for inner in &when.body {
                        execute_statement(inner, &child, ctx)?;
                    }
                    return Ok(());
                }
            }
            if let Some(body) = otherwise {
                let child = scope.child();
                for inner in body {
                    execute_statement(inner, &child, ctx)?;
                }
            }
            Ok(())
        }

        Statement::Variable { name, select } => {
            let value = collapse(eval_value(select, scope, ctx, stmt.tag())?);
            scope.assign(name, value);
            Ok(())
        }

        Statement::Param { name, select } => {
            if !scope.is_root() {
                return Err(TransformError::Statement {
                    statement: stmt.tag(),
                    message: format!(
                        "parameter '{}' may only be declared at the transform root",
                        name
                    ),
                });
            }
            if scope.has_own(name) {
                return Err(TransformError::ParameterReassigned { name: name.clone() });
            }
            match ctx.params.get(name) {
                Some(value) => {
                    scope.bind(name, value.clone());
                    Ok(())
                }
                None => {
                    let value = collapse(eval_value(select, scope, ctx, stmt.tag())?);
                    scope.assign(name, value);
                    Ok(())
                }
            }
        }
    }
}

/// A one-element node-set collapses to the node itself before binding.
fn collapse(value: Value) -> Value {
    if let Value::Nodes(nodes) = &value {
        if let [node] = nodes.as_slice() {
            return Value::Node(node.clone());
        }
    }
    value
}

// ----------------------------------------------------------------------
// Sorting
// ----------------------------------------------------------------------

struct SortLevel {
    keys: Vec<String>,
    reverse: bool,
    comparator: Option<String>,
}

/// Stable sort under the composite comparator: the first spec is the
/// primary key, each further spec breaks ties in declared order.
fn sort_items(
    items: Vec<Node>,
    sorts: &[SortSpec],
    scope: &StatementContext,
    ctx: &TransformContext,
) -> Result<Vec<Node>, TransformError> {
    let mut levels = Vec::with_capacity(sorts.len());
    for spec in sorts {
        let reverse = match &spec.reverse {
            Some(expr) => eval_bool(expr, scope, ctx, "sort")?,
            None => false,
        };
        let mut keys = Vec::with_capacity(items.len());
        for item in &items {
            keys.push(eval_string_at(&spec.key, item, scope, ctx, "sort")?);
        }
        levels.push(SortLevel {
            keys,
            reverse,
            comparator: spec.comparator.clone(),
        });
    }

    // sort_by cannot propagate errors, so a comparator failure is stashed
    // and surfaced after the sort returns.
    let failure: RefCell<Option<TransformError>> = RefCell::new(None);
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        if failure.borrow().is_some() {
            return Ordering::Equal;
        }
        for level in &levels {
            let result = match &level.comparator {
                None => level.keys[a].cmp(&level.keys[b]),
                Some(template) => {
                    match compare_keys(template, &level.keys[a], &level.keys[b], scope, ctx) {
                        Ok(ord) => ord,
                        Err(e) => {
                            *failure.borrow_mut() = Some(e);
                            return Ordering::Equal;
                        }
                    }
                }
            };
            let result = if level.reverse { result.reverse() } else { result };
            if result != Ordering::Equal {
                return result;
            }
        }
        Ordering::Equal
    });
    if let Some(e) = failure.into_inner() {
        return Err(e);
    }
    Ok(order.into_iter().map(|i| items[i].clone()).collect())
}

/// Splice two keys into the comparator template, evaluate as a number,
/// take the sign.
fn compare_keys(
    template: &str,
    a: &str,
    b: &str,
    scope: &StatementContext,
    ctx: &TransformContext,
) -> Result<Ordering, TransformError> {
    let spliced = splice_comparator(template, a, b).map_err(|message| {
        TransformError::Statement {
            statement: "sort",
            message,
        }
    })?;
    let n = eval_number(&spliced, scope, ctx, "sort")?;
    Ok(if n < 0.0 {
        Ordering::Less
    } else if n > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    })
}

fn splice_comparator(template: &str, a: &str, b: &str) -> Result<String, String> {
    let mut literals = [quote_literal(a)?, quote_literal(b)?].into_iter();
    let mut out = String::with_capacity(template.len() + a.len() + b.len());
    for ch in template.chars() {
        if ch == '?' {
            // The parser guarantees exactly two markers
            out.push_str(&literals.next().unwrap_or_default());
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

/// Quote a sort key as an expression string literal. The expression
/// grammar has no escapes inside literals, so a key containing both
/// quote kinds cannot be spliced.
fn quote_literal(key: &str) -> Result<String, String> {
    if !key.contains('\'') {
        Ok(format!("'{}'", key))
    } else if !key.contains('"') {
        Ok(format!("\"{}\"", key))
    } else {
        Err(format!(
            "sort key '{}' contains both quote kinds and cannot be compared by expression",
            key
        ))
    }
}

// ----------------------------------------------------------------------
// Expression evaluation helpers
// ----------------------------------------------------------------------

fn compile(
    text: &str,
    ctx: &TransformContext,
    statement: &'static str,
) -> Result<Box<dyn CompiledQuery>, TransformError> {
    ctx.engine
        .compile(text)
        .map_err(|cause| TransformError::Query { statement, cause })
}

fn eval_value(
    text: &str,
    scope: &StatementContext,
    ctx: &TransformContext,
    statement: &'static str,
) -> Result<Value, TransformError> {
    let query = compile(text, ctx, statement)?;
    query
        .evaluate(&QueryContext::new(scope.context_node(), scope))
        .map_err(|cause| TransformError::Query { statement, cause })
}

fn eval_string(
    text: &str,
    scope: &StatementContext,
    ctx: &TransformContext,
    statement: &'static str,
) -> Result<String, TransformError> {
    let query = compile(text, ctx, statement)?;
    query
        .string_value(&QueryContext::new(scope.context_node(), scope))
        .map_err(|cause| TransformError::Query { statement, cause })
}

/// Like [`eval_string`], but against an explicit context node (sort keys
/// are evaluated per item before iteration rebinds the scope).
fn eval_string_at(
    text: &str,
    node: &Node,
    scope: &StatementContext,
    ctx: &TransformContext,
    statement: &'static str,
) -> Result<String, TransformError> {
    let query = compile(text, ctx, statement)?;
    query
        .string_value(&QueryContext::new(Some(node.clone()), scope))
        .map_err(|cause| TransformError::Query { statement, cause })
}

fn eval_bool(
    text: &str,
    scope: &StatementContext,
    ctx: &TransformContext,
    statement: &'static str,
) -> Result<bool, TransformError> {
    let query = compile(text, ctx, statement)?;
    query
        .boolean_value(&QueryContext::new(scope.context_node(), scope))
        .map_err(|cause| TransformError::Query { statement, cause })
}

fn eval_number(
    text: &str,
    scope: &StatementContext,
    ctx: &TransformContext,
    statement: &'static str,
) -> Result<f64, TransformError> {
    let query = compile(text, ctx, statement)?;
    query
        .number_value(&QueryContext::new(scope.context_node(), scope))
        .map_err(|cause| TransformError::Query { statement, cause })
}
