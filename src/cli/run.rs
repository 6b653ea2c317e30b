//! Execute recipes against source documents

use super::CliError;
use crate::interpreter::{execute, TransformContext};
use crate::value::Value;
use crate::{output, parser, tree};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The recipe text to execute
    pub recipe: String,
    /// Source document text, if any
    pub input: Option<String>,
    /// Parameter overrides
    pub params: Vec<(String, Value)>,
    /// Pretty-print the output tree
    pub pretty: bool,
}

/// Result of a run operation
#[derive(Debug)]
pub enum RunOutcome {
    /// The transform produced an output tree, rendered as text
    Tree(String),
    /// The transform produced no output node
    Empty,
}

/// Execute a recipe end to end.
pub fn execute_run(options: RunOptions) -> Result<RunOutcome, CliError> {
    let raw = tree::read_str(&options.recipe)?;
    let transform = parser::parse(&raw)?;

    let mut ctx = TransformContext::new();
    if let Some(input) = &options.input {
        ctx = ctx.with_source(tree::read_str(input)?);
    }
    for (name, value) in options.params {
        ctx = ctx.with_param(name, value);
    }

    match execute(&transform, &ctx)? {
        Some(node) => {
            let text = if options.pretty {
                output::to_text_pretty(&node)
            } else {
                output::to_text(&node)
            };
            Ok(RunOutcome::Tree(text))
        }
        None => Ok(RunOutcome::Empty),
    }
}

/// Parse a `NAME=VALUE` override. The value reads as a JSON scalar first
/// so numbers and booleans keep their type; anything else is a string.
pub fn parse_param(spec: &str) -> Result<(String, Value), CliError> {
    let (name, raw) = spec
        .split_once('=')
        .ok_or_else(|| CliError::BadParam(spec.to_string()))?;
    if name.is_empty() {
        return Err(CliError::BadParam(spec.to_string()));
    }

    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Number(n)) => Value::Num(n.as_f64().unwrap_or(f64::NAN)),
        Ok(serde_json::Value::Bool(b)) => Value::Bool(b),
        Ok(serde_json::Value::String(s)) => Value::Str(s),
        _ => Value::Str(raw.to_string()),
    };
    Ok((name.to_string(), value))
}
