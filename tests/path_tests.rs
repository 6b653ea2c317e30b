// tests/path_tests.rs

use std::collections::HashMap;

use sprig_lang::path::PathEngine;
use sprig_lang::query::{NoBindings, QueryContext, QueryEngine, QueryError, VariableResolver};
use sprig_lang::tree::{self, Node};
use sprig_lang::Value;

fn doc() -> Node {
    tree::read_str(
        "doc { item { name \"pear\" price \"3\" } item { name \"apple\" price \"1\" } flag \"yes\" }",
    )
    .unwrap()
}

struct Bindings(HashMap<String, Value>);

impl Bindings {
    fn new(pairs: Vec<(&str, Value)>) -> Self {
        Bindings(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl VariableResolver for Bindings {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }
}

fn eval(expr: &str, node: &Node) -> Value {
    eval_with(expr, Some(node.clone()), &NoBindings)
}

fn eval_with(expr: &str, node: Option<Node>, vars: &dyn VariableResolver) -> Value {
    let engine = PathEngine::new();
    let query = engine.compile(expr).unwrap();
    query.evaluate(&QueryContext::new(node, vars)).unwrap()
}

fn eval_string(expr: &str, node: &Node) -> String {
    eval(expr, node).as_string()
}

// ============================================================================
// Literals and arithmetic
// ============================================================================

#[test]
fn test_string_literals() {
    let d = doc();
    assert_eq!(eval("'hello'", &d), Value::Str("hello".to_string()));
    assert_eq!(eval("\"double\"", &d), Value::Str("double".to_string()));
}

#[test]
fn test_number_literals() {
    let d = doc();
    assert_eq!(eval("3.5", &d), Value::Num(3.5));
    assert_eq!(eval("42", &d), Value::Num(42.0));
}

#[test]
fn test_arithmetic_precedence() {
    let d = doc();
    assert_eq!(eval("1 + 2 * 3", &d), Value::Num(7.0));
    assert_eq!(eval("(1 + 2) * 3", &d), Value::Num(9.0));
    assert_eq!(eval("10 div 4", &d), Value::Num(2.5));
    assert_eq!(eval("7 mod 4", &d), Value::Num(3.0));
    assert_eq!(eval("-2 + 1", &d), Value::Num(-1.0));
}

#[test]
fn test_number_rendering_is_shortest_form() {
    let d = doc();
    assert_eq!(eval_string("2 + 1", &d), "3");
    assert_eq!(eval_string("5 div 2", &d), "2.5");
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_child_step() {
    let d = doc();
    let result = eval("item", &d);
    match result {
        Value::Nodes(nodes) => assert_eq!(nodes.len(), 2),
        other => panic!("expected a node-set, got {:?}", other),
    }
}

#[test]
fn test_multi_step_path() {
    let d = doc();
    let result = eval("item/name", &d);
    match result {
        Value::Nodes(nodes) => {
            assert_eq!(nodes.len(), 2);
            assert_eq!(nodes[0].string_value(), "pear");
            assert_eq!(nodes[1].string_value(), "apple");
        }
        other => panic!("expected a node-set, got {:?}", other),
    }
}

#[test]
fn test_wildcard_step() {
    let d = doc();
    match eval("*", &d) {
        Value::Nodes(nodes) => assert_eq!(nodes.len(), 3),
        other => panic!("expected a node-set, got {:?}", other),
    }
}

#[test]
fn test_dot_selects_context() {
    let d = doc();
    match eval(".", &d) {
        Value::Nodes(nodes) => {
            assert_eq!(nodes.len(), 1);
            assert!(nodes[0].same_node(&d));
        }
        other => panic!("expected a node-set, got {:?}", other),
    }
}

#[test]
fn test_positional_predicate() {
    let d = doc();
    assert_eq!(eval_string("item[1]/name", &d), "pear");
    assert_eq!(eval_string("item[2]/name", &d), "apple");
}

#[test]
fn test_boolean_predicate() {
    let d = doc();
    assert_eq!(eval_string("item[price > 2]/name", &d), "pear");
    assert_eq!(eval_string("item[name = 'apple']/price", &d), "1");
}

#[test]
fn test_missing_step_selects_nothing() {
    let d = doc();
    match eval("missing/anything", &d) {
        Value::Nodes(nodes) => assert!(nodes.is_empty()),
        other => panic!("expected a node-set, got {:?}", other),
    }
}

#[test]
fn test_relative_path_without_context_is_empty() {
    match eval_with("item", None, &NoBindings) {
        Value::Nodes(nodes) => assert!(nodes.is_empty()),
        other => panic!("expected a node-set, got {:?}", other),
    }
    // Literals still work with no context
    assert_eq!(eval_with("'a'", None, &NoBindings), Value::Str("a".to_string()));
}

// ============================================================================
// Comparisons and logic
// ============================================================================

#[test]
fn test_nodeset_equality_is_existential() {
    let d = doc();
    assert_eq!(eval("item/price = '3'", &d), Value::Bool(true));
    assert_eq!(eval("item/price = '9'", &d), Value::Bool(false));
    assert_eq!(eval("item/price != '3'", &d), Value::Bool(true));
}

#[test]
fn test_numeric_comparison() {
    let d = doc();
    assert_eq!(eval("count(item) = 2", &d), Value::Bool(true));
    assert_eq!(eval("2 < 10", &d), Value::Bool(true));
    assert_eq!(eval("'2' < '10'", &d), Value::Bool(true));
}

#[test]
fn test_logic_short_circuits() {
    let d = doc();
    assert_eq!(eval("flag = 'yes' and count(item) > 1", &d), Value::Bool(true));
    // The undefined variable on the right is never evaluated
    assert_eq!(eval("1 = 1 or $missing", &d), Value::Bool(true));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_count() {
    let d = doc();
    assert_eq!(eval("count(item)", &d), Value::Num(2.0));
    assert_eq!(eval("count(missing)", &d), Value::Num(0.0));
}

#[test]
fn test_string_functions() {
    let d = doc();
    assert_eq!(eval_string("concat('a', 'b', 'c')", &d), "abc");
    assert_eq!(eval("contains('pear', 'ea')", &d), Value::Bool(true));
    assert_eq!(eval("starts-with('pear', 'pe')", &d), Value::Bool(true));
    assert_eq!(eval("string-length('abc')", &d), Value::Num(3.0));
    assert_eq!(eval_string("normalize-space('  a   b ')", &d), "a b");
}

#[test]
fn test_not_and_boolean() {
    let d = doc();
    assert_eq!(eval("not(false())", &d), Value::Bool(true));
    assert_eq!(eval("boolean('x')", &d), Value::Bool(true));
    assert_eq!(eval("boolean('')", &d), Value::Bool(false));
}

#[test]
fn test_name_of_context() {
    let d = doc();
    assert_eq!(eval_string("name()", &d), "doc");
}

#[test]
fn test_conversion_functions() {
    let d = doc();
    assert_eq!(eval("number('4') + 1", &d), Value::Num(5.0));
    assert_eq!(eval_string("string(2 = 2)", &d), "true");
}

#[test]
fn test_unknown_function_is_an_error() {
    let engine = PathEngine::new();
    let query = engine.compile("frobnicate(1)").unwrap();
    let err = query
        .evaluate(&QueryContext::new(None, &NoBindings))
        .unwrap_err();
    assert!(matches!(err, QueryError::Type(_)));
}

// ============================================================================
// Variables
// ============================================================================

#[test]
fn test_variable_reference() {
    let vars = Bindings::new(vec![("x", Value::Num(5.0))]);
    assert_eq!(eval_with("$x + 1", None, &vars), Value::Num(6.0));
}

#[test]
fn test_path_from_node_variable() {
    let d = doc();
    let vars = Bindings::new(vec![("s", Value::Node(d))]);
    match eval_with("$s/item", None, &vars) {
        Value::Nodes(nodes) => assert_eq!(nodes.len(), 2),
        other => panic!("expected a node-set, got {:?}", other),
    }
}

#[test]
fn test_undefined_variable_is_an_error() {
    let engine = PathEngine::new();
    let query = engine.compile("$nope").unwrap();
    let err = query
        .evaluate(&QueryContext::new(None, &NoBindings))
        .unwrap_err();
    assert!(matches!(err, QueryError::UndefinedVariable(name) if name == "nope"));
}

#[test]
fn test_path_from_scalar_variable_is_an_error() {
    let vars = Bindings::new(vec![("x", Value::Num(5.0))]);
    let engine = PathEngine::new();
    let query = engine.compile("$x/item").unwrap();
    let err = query
        .evaluate(&QueryContext::new(None, &vars))
        .unwrap_err();
    assert!(matches!(err, QueryError::Type(_)));
}

// ============================================================================
// Coercions through the engine interface
// ============================================================================

#[test]
fn test_boolean_value_of_nodeset() {
    let d = doc();
    let engine = PathEngine::new();

    let query = engine.compile("flag").unwrap();
    let ctx = QueryContext::new(Some(d.clone()), &NoBindings);
    assert!(query.boolean_value(&ctx).unwrap());

    let query = engine.compile("missing").unwrap();
    assert!(!query.boolean_value(&ctx).unwrap());
}

#[test]
fn test_string_value_of_nodeset_is_first_node() {
    let d = doc();
    let engine = PathEngine::new();
    let query = engine.compile("item/name").unwrap();
    let ctx = QueryContext::new(Some(d), &NoBindings);
    assert_eq!(query.string_value(&ctx).unwrap(), "pear");
}

#[test]
fn test_select_nodes_rejects_scalars() {
    let engine = PathEngine::new();
    let query = engine.compile("'a'").unwrap();
    let err = query
        .select_nodes(&QueryContext::new(None, &NoBindings))
        .unwrap_err();
    assert!(matches!(err, QueryError::Type(_)));
}

#[test]
fn test_syntax_errors() {
    let engine = PathEngine::new();
    assert!(matches!(
        engine.compile("item[").map(|_| ()),
        Err(QueryError::Syntax { .. })
    ));
    assert!(matches!(
        engine.compile("1 +").map(|_| ()),
        Err(QueryError::Syntax { .. })
    ));
    assert!(matches!(
        engine.compile("'open").map(|_| ()),
        Err(QueryError::Syntax { .. })
    ));
}
