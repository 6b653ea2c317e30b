use crate::path::ast::{BinOp, Expr, NameTest, PathExpr, PathStart, Step};
use crate::path::lexer::Lexer;
use crate::path::parser::Parser;
use crate::query::{CompiledQuery, QueryContext, QueryEngine, QueryError};
use crate::tree::Node;
use crate::value::{type_name, Value};

/// The default query engine: compiles path-expression text.
#[derive(Debug, Default)]
pub struct PathEngine;

impl PathEngine {
    pub fn new() -> Self {
        PathEngine
    }
}

impl QueryEngine for PathEngine {
    fn compile(&self, text: &str) -> Result<Box<dyn CompiledQuery>, QueryError> {
        let lexer = Lexer::new(text);
        let mut parser = Parser::new(lexer)?;
        let expr = parser.parse()?;
        Ok(Box::new(CompiledPath { expr }))
    }
}

/// A compiled path expression.
pub struct CompiledPath {
    expr: Expr,
}

impl CompiledQuery for CompiledPath {
    fn select_nodes(&self, ctx: &QueryContext) -> Result<Vec<Node>, QueryError> {
        let value = eval_expr(&self.expr, ctx)?;
        value.as_nodes().ok_or_else(|| {
            QueryError::Type(format!(
                "expected a node-set, the expression produced a {}",
                type_name(&value)
            ))
        })
    }

    fn string_value(&self, ctx: &QueryContext) -> Result<String, QueryError> {
        Ok(eval_expr(&self.expr, ctx)?.as_string())
    }

    fn boolean_value(&self, ctx: &QueryContext) -> Result<bool, QueryError> {
        Ok(eval_expr(&self.expr, ctx)?.as_bool())
    }

    fn number_value(&self, ctx: &QueryContext) -> Result<f64, QueryError> {
        Ok(eval_expr(&self.expr, ctx)?.as_number())
    }

    fn evaluate(&self, ctx: &QueryContext) -> Result<Value, QueryError> {
        eval_expr(&self.expr, ctx)
    }
}

fn eval_expr(expr: &Expr, ctx: &QueryContext) -> Result<Value, QueryError> {
    match expr {
        Expr::Number(n) => Ok(Value::Num(*n)),
        Expr::Literal(s) => Ok(Value::Str(s.clone())),
        Expr::Variable(name) => ctx
            .variables
            .resolve(name)
            .ok_or_else(|| QueryError::UndefinedVariable(name.clone())),
        Expr::Negate(inner) => Ok(Value::Num(-eval_expr(inner, ctx)?.as_number())),
        Expr::Path(path) => eval_path(path, ctx).map(Value::Nodes),
        Expr::FunctionCall { name, args } => eval_function(name, args, ctx),
        Expr::BinaryOp { op, left, right } => match op {
            // Logical operators short-circuit
            BinOp::Or => {
                if eval_expr(left, ctx)?.as_bool() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(eval_expr(right, ctx)?.as_bool()))
            }
            BinOp::And => {
                if !eval_expr(left, ctx)?.as_bool() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(eval_expr(right, ctx)?.as_bool()))
            }
            _ => {
                let left_val = eval_expr(left, ctx)?;
                let right_val = eval_expr(right, ctx)?;
                apply_binop(*op, &left_val, &right_val)
            }
        },
    }
}

fn eval_path(path: &PathExpr, ctx: &QueryContext) -> Result<Vec<Node>, QueryError> {
    let mut current: Vec<Node> = match &path.start {
        PathStart::Context => ctx.node.iter().cloned().collect(),
        PathStart::Variable(name) => {
            let value = ctx
                .variables
                .resolve(name)
                .ok_or_else(|| QueryError::UndefinedVariable(name.clone()))?;
            value.as_nodes().ok_or_else(|| {
                QueryError::Type(format!(
                    "cannot take a path step from ${}, a {}",
                    name,
                    type_name(&value)
                ))
            })?
        }
    };

    for step in &path.steps {
        current = eval_step(step, &current, ctx)?;
        if current.is_empty() {
            break;
        }
    }
    Ok(current)
}

fn eval_step(step: &Step, nodes: &[Node], ctx: &QueryContext) -> Result<Vec<Node>, QueryError> {
    let mut selected = Vec::new();
    for node in nodes {
        match &step.test {
            NameTest::Name(name) => selected.extend(node.children_named(name)),
            NameTest::Any => selected.extend(node.children()),
        }
    }

    for predicate in &step.predicates {
        selected = apply_predicate(predicate, selected, ctx)?;
    }
    Ok(selected)
}

/// A numeric predicate selects the n-th candidate (1-based); any other
/// result keeps the candidates for which it is true.
fn apply_predicate(
    predicate: &Expr,
    candidates: Vec<Node>,
    ctx: &QueryContext,
) -> Result<Vec<Node>, QueryError> {
    let mut kept = Vec::new();
    for (index, node) in candidates.iter().enumerate() {
        let inner = QueryContext::new(Some(node.clone()), ctx.variables);
        let result = eval_expr(predicate, &inner)?;
        let keep = match &result {
            Value::Num(n) => (index + 1) as f64 == *n,
            other => other.as_bool(),
        };
        if keep {
            kept.push(node.clone());
        }
    }
    Ok(kept)
}

fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, QueryError> {
    match op {
        BinOp::Eq => Ok(Value::Bool(compare_eq(left, right))),
        BinOp::NotEq => Ok(Value::Bool(!compare_eq(left, right))),
        BinOp::Lt => Ok(Value::Bool(left.as_number() < right.as_number())),
        BinOp::LtEq => Ok(Value::Bool(left.as_number() <= right.as_number())),
        BinOp::Gt => Ok(Value::Bool(left.as_number() > right.as_number())),
        BinOp::GtEq => Ok(Value::Bool(left.as_number() >= right.as_number())),
        BinOp::Add => Ok(Value::Num(left.as_number() + right.as_number())),
        BinOp::Subtract => Ok(Value::Num(left.as_number() - right.as_number())),
        BinOp::Multiply => Ok(Value::Num(left.as_number() * right.as_number())),
        BinOp::Divide => Ok(Value::Num(left.as_number() / right.as_number())),
        BinOp::Modulo => Ok(Value::Num(left.as_number() % right.as_number())),
        BinOp::Or | BinOp::And => unreachable!("handled before operand evaluation"),
    }
}

/// Equality. Node-sets compare existentially on string values; otherwise
/// the comparison happens in the stronger of the two types.
fn compare_eq(left: &Value, right: &Value) -> bool {
    match (left.as_nodes(), right.as_nodes()) {
        (Some(lns), Some(rns)) => {
            let rvals: Vec<String> = rns.iter().map(Node::string_value).collect();
            lns.iter().any(|l| rvals.contains(&l.string_value()))
        }
        (Some(lns), None) => lns.iter().any(|l| scalar_eq(&Value::Str(l.string_value()), right)),
        (None, Some(rns)) => rns.iter().any(|r| scalar_eq(left, &Value::Str(r.string_value()))),
        (None, None) => scalar_eq(left, right),
    }
}

fn scalar_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Bool(_), _) | (_, Value::Bool(_)) => left.as_bool() == right.as_bool(),
        (Value::Num(_), _) | (_, Value::Num(_)) => left.as_number() == right.as_number(),
        _ => left.as_string() == right.as_string(),
    }
}

fn eval_function(name: &str, args: &[Expr], ctx: &QueryContext) -> Result<Value, QueryError> {
    let arity = |expected: std::ops::RangeInclusive<usize>| -> Result<(), QueryError> {
        if expected.contains(&args.len()) {
            Ok(())
        } else {
            Err(QueryError::Type(format!(
                "{}() expects {} to {} arguments, got {}",
                name,
                expected.start(),
                expected.end(),
                args.len()
            )))
        }
    };

    // 0-argument string functions default to the context node
    let arg_or_context = |args: &[Expr]| -> Result<Value, QueryError> {
        match args.first() {
            Some(expr) => eval_expr(expr, ctx),
            None => Ok(match &ctx.node {
                Some(node) => Value::Node(node.clone()),
                None => Value::Str(String::new()),
            }),
        }
    };

    match name {
        "true" => {
            arity(0..=0)?;
            Ok(Value::Bool(true))
        }
        "false" => {
            arity(0..=0)?;
            Ok(Value::Bool(false))
        }
        "not" => {
            arity(1..=1)?;
            Ok(Value::Bool(!eval_expr(&args[0], ctx)?.as_bool()))
        }
        "count" => {
            arity(1..=1)?;
            let value = eval_expr(&args[0], ctx)?;
            let nodes = value.as_nodes().ok_or_else(|| {
                QueryError::Type(format!("count() expects a node-set, got a {}", type_name(&value)))
            })?;
            Ok(Value::Num(nodes.len() as f64))
        }
        "string" => {
            arity(0..=1)?;
            Ok(Value::Str(arg_or_context(args)?.as_string()))
        }
        "number" => {
            arity(0..=1)?;
            Ok(Value::Num(arg_or_context(args)?.as_number()))
        }
        "boolean" => {
            arity(1..=1)?;
            Ok(Value::Bool(eval_expr(&args[0], ctx)?.as_bool()))
        }
        "concat" => {
            if args.len() < 2 {
                return Err(QueryError::Type(format!(
                    "concat() expects at least 2 arguments, got {}",
                    args.len()
                )));
            }
            let mut out = String::new();
            for arg in args {
                out.push_str(&eval_expr(arg, ctx)?.as_string());
            }
            Ok(Value::Str(out))
        }
        "contains" => {
            arity(2..=2)?;
            let haystack = eval_expr(&args[0], ctx)?.as_string();
            let needle = eval_expr(&args[1], ctx)?.as_string();
            Ok(Value::Bool(haystack.contains(&needle)))
        }
        "starts-with" => {
            arity(2..=2)?;
            let haystack = eval_expr(&args[0], ctx)?.as_string();
            let prefix = eval_expr(&args[1], ctx)?.as_string();
            Ok(Value::Bool(haystack.starts_with(&prefix)))
        }
        "string-length" => {
            arity(0..=1)?;
            Ok(Value::Num(arg_or_context(args)?.as_string().chars().count() as f64))
        }
        "normalize-space" => {
            arity(0..=1)?;
            let s = arg_or_context(args)?.as_string();
            Ok(Value::Str(s.split_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "name" => {
            arity(0..=0)?;
            Ok(Value::Str(ctx.node.as_ref().map(Node::name).unwrap_or_default()))
        }
        _ => Err(QueryError::Type(format!("unknown function {}()", name))),
    }
}
