//! Values produced by query evaluation and held in variable bindings.
//!
//! A [`Value`] is what a query expression evaluates to and what a
//! `variable`/`param` binding stores: a string, a number, a boolean, a
//! single tree node, or an ordered node-set. Coercions between these
//! follow path-expression conventions: a node coerces through its string
//! value, a node-set through its first node, and numbers render in
//! shortest form (integral values print without a fractional part).

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::tree::Node;

/// A query result or variable binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String value
    Str(String),

    /// Numeric value (IEEE double, like path-expression numbers)
    Num(f64),

    /// Boolean value
    Bool(bool),

    /// A single tree node (a collapsed one-element selection)
    Node(Node),

    /// An ordered node-set
    Nodes(Vec<Node>),
}

impl Value {
    /// String coercion.
    ///
    /// A node-set coerces through the string value of its first node; an
    /// empty node-set is the empty string.
    pub fn as_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Num(n) => number_to_string(*n),
            Value::Bool(b) => b.to_string(),
            Value::Node(node) => node.string_value(),
            Value::Nodes(nodes) => nodes.first().map(Node::string_value).unwrap_or_default(),
        }
    }

    /// Numeric coercion; anything that does not read as a number is NaN.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Num(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => other.as_string().trim().parse::<f64>().unwrap_or(f64::NAN),
        }
    }

    /// Boolean coercion: non-empty string, non-zero finite number,
    /// non-empty node-set.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Str(s) => !s.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
            Value::Node(_) => true,
            Value::Nodes(nodes) => !nodes.is_empty(),
        }
    }

    /// The node-set view, if this value is one or more nodes.
    pub fn as_nodes(&self) -> Option<Vec<Node>> {
        match self {
            Value::Node(node) => Some(vec![node.clone()]),
            Value::Nodes(nodes) => Some(nodes.clone()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

/// Returns a human-readable type name for a Value
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Str(_) => "string",
        Value::Num(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Node(_) => "node",
        Value::Nodes(_) => "node-set",
    }
}

/// Render a number in its shortest form: `2` rather than `2.0`, and a
/// decimal expansion without float artifacts where one exists.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    match Decimal::from_f64(n) {
        Some(d) => {
            let d = d.normalize();
            if d.is_integer() {
                if let Some(i) = d.to_i64() {
                    return i.to_string();
                }
            }
            d.to_string()
        }
        None => n.to_string(),
    }
}

#[test]
fn test_number_rendering() {
    assert_eq!(number_to_string(2.0), "2");
    assert_eq!(number_to_string(-0.5), "-0.5");
    assert_eq!(number_to_string(f64::NAN), "NaN");
}
