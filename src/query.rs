//! The interface between the interpreter and a query-expression engine.
//!
//! The interpreter never evaluates path expressions itself. It asks a
//! [`QueryEngine`] to compile stored expression text at each evaluation
//! site, then asks the resulting [`CompiledQuery`] for a node-set, string,
//! boolean, or number against a [`QueryContext`]. Variable references are
//! resolved through the injected [`VariableResolver`], which the scope
//! chain implements.
//!
//! The default engine is [`crate::path::PathEngine`]; an alternate engine
//! can be supplied through the execution environment.

use std::fmt;

use crate::tree::Node;
use crate::value::Value;

/// Resolves `$name` references during evaluation.
pub trait VariableResolver {
    /// The value bound to `name`, or None when unresolved.
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// A resolver with no bindings.
pub struct NoBindings;

impl VariableResolver for NoBindings {
    fn resolve(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// What a query is evaluated against: an optional context node and the
/// variable bindings in force.
pub struct QueryContext<'a> {
    /// The context node; relative paths select nothing when unset.
    pub node: Option<Node>,
    /// Bindings for `$name` references.
    pub variables: &'a dyn VariableResolver,
}

impl<'a> QueryContext<'a> {
    pub fn new(node: Option<Node>, variables: &'a dyn VariableResolver) -> Self {
        QueryContext { node, variables }
    }
}

/// Errors raised while compiling or evaluating a query expression.
#[derive(Debug, Clone)]
pub enum QueryError {
    /// The expression text does not parse
    Syntax { message: String, position: usize },

    /// Type mismatch or invalid operation during evaluation
    Type(String),

    /// `$name` reference with no binding in force
    UndefinedVariable(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Syntax { message, position } => {
                write!(f, "syntax error at offset {}: {}", position, message)
            }
            QueryError::Type(msg) => write!(f, "type error: {}", msg),
            QueryError::UndefinedVariable(name) => {
                write!(f, "undefined variable: ${} is not bound", name)
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// A compiled query expression, bound to the text it was compiled from.
///
/// Compiled queries are not reusable across executions; the interpreter
/// recompiles at every evaluation site.
pub trait CompiledQuery {
    /// Evaluate to an ordered node-set; non-node results are an error.
    fn select_nodes(&self, ctx: &QueryContext) -> Result<Vec<Node>, QueryError>;

    /// Evaluate and coerce to a string.
    fn string_value(&self, ctx: &QueryContext) -> Result<String, QueryError>;

    /// Evaluate and coerce to a boolean.
    fn boolean_value(&self, ctx: &QueryContext) -> Result<bool, QueryError>;

    /// Evaluate and coerce to a number.
    fn number_value(&self, ctx: &QueryContext) -> Result<f64, QueryError>;

    /// Evaluate to whatever the expression produces.
    fn evaluate(&self, ctx: &QueryContext) -> Result<Value, QueryError>;
}

/// Compiles expression text into executable queries.
pub trait QueryEngine {
    fn compile(&self, text: &str) -> Result<Box<dyn CompiledQuery>, QueryError>;
}
