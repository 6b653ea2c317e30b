// tests/integration_tests.rs

use sprig_lang::interpreter::{execute, TransformContext};
use sprig_lang::output::{to_text, to_text_pretty};
use sprig_lang::tree::{self, Node};
use sprig_lang::{parser, Transform};

fn compile(recipe: &str) -> Transform {
    let raw = tree::read_str(recipe).unwrap();
    parser::parse(&raw).unwrap()
}

fn run(recipe: &str, source: &str) -> Option<Node> {
    let transform = compile(recipe);
    let ctx = TransformContext::new()
        .with_sink(Vec::<u8>::new())
        .with_source(tree::read_str(source).unwrap());
    execute(&transform, &ctx).unwrap()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_catalog_report() {
    let source = "catalog { \
                  item { name \"plum\" price \"4\" } \
                  item { name \"apple\" price \"1\" } \
                  item { name \"pear\" price \"12\" } }";

    let recipe = "transform { \
                  param \"minimum\" { select \"2\" } \
                  node \"report\" { \
                      node \"count\" { value \"count(item[price >= $minimum])\" } \
                      foreach \"item[price >= $minimum]\" { \
                          sort \"price\" { comparator \"number(?) - number(?)\" } \
                          node \"line\" { value \"concat($position, '. ', name, ' @ ', price)\" } \
                      } \
                  } }";

    let result = run(recipe, source).unwrap();
    assert_eq!(
        to_text(&result),
        "report { count \"2\" line \"1. plum @ 4\" line \"2. pear @ 12\" }"
    );
}

#[test]
fn test_grouping_with_choose() {
    let source = "inventory { \
                  item { name \"anvil\" stock \"0\" } \
                  item { name \"rope\" stock \"40\" } }";

    let recipe = "transform { \
                  node \"status\" { \
                      foreach \"item\" { \
                          choose { \
                              when \"stock = '0'\" { \
                                  node \"missing\" { value \"name\" } } \
                              otherwise { \
                                  node \"stocked\" { value \"name\" } } \
                          } \
                      } \
                  } }";

    let result = run(recipe, source).unwrap();
    assert_eq!(
        to_text(&result),
        "status { missing \"anvil\" stocked \"rope\" }"
    );
}

#[test]
fn test_copy_preserves_structure() {
    let source = "doc { section { title \"One\" para \"a\" para \"b\" } }";
    let recipe = "transform { node \"extract\" { copy \"section\" } }";

    let result = run(recipe, source).unwrap();
    assert_eq!(
        to_text(&result),
        "extract { section { title \"One\" para \"a\" para \"b\" } }"
    );
}

#[test]
fn test_parameter_override_changes_selection() {
    let source = "catalog { item { name \"a\" price \"1\" } item { name \"b\" price \"8\" } }";
    let recipe = "transform { \
                  param \"minimum\" { select \"0\" } \
                  node \"picked\" { \
                      foreach \"item[price > $minimum]\" { \
                          node \"n\" { value \"name\" } } } }";

    let transform = compile(recipe);
    let both = TransformContext::new()
        .with_sink(Vec::<u8>::new())
        .with_source(tree::read_str(source).unwrap());
    let result = execute(&transform, &both).unwrap().unwrap();
    assert_eq!(result.child_count(), 2);

    let filtered = TransformContext::new()
        .with_sink(Vec::<u8>::new())
        .with_source(tree::read_str(source).unwrap())
        .with_param("minimum", 5.0);
    let result = execute(&transform, &filtered).unwrap().unwrap();
    assert_eq!(result.child_count(), 1);
    assert_eq!(result.children()[0].string_value(), "b");
}

#[test]
fn test_variable_accumulation_across_iterations() {
    let source = "doc { item \"2\" item \"3\" item \"5\" }";
    let recipe = "transform { \
                  variable \"total\" { select \"0\" } \
                  foreach \"item\" { \
                      variable \"total\" { select \"$total + .\" } } \
                  node \"sum\" { value \"$total\" } }";

    let result = run(recipe, source).unwrap();
    assert_eq!(to_text(&result), "sum \"10\"");
}

#[test]
fn test_pretty_rendering_of_result() {
    let source = "doc { title \"T\" }";
    let recipe = "transform { node \"page\" { node \"h1\" { value \"title\" } } }";

    let result = run(recipe, source).unwrap();
    assert_eq!(to_text_pretty(&result), "page {\n  h1 \"T\"\n}");
}

#[test]
fn test_round_trip_then_execute_matches() {
    let source = "doc { item \"b\" item \"a\" }";
    let recipe = "transform { node \"out\" { foreach \"item\" { sort \".\" \
                  node \"v\" { value \".\" } } } }";

    let first = compile(recipe);
    let second = compile(&first.to_recipe());
    assert_eq!(first, second);

    let ctx = TransformContext::new()
        .with_sink(Vec::<u8>::new())
        .with_source(tree::read_str(source).unwrap());
    let from_first = execute(&first, &ctx).unwrap().unwrap();
    let from_second = execute(&second, &ctx).unwrap().unwrap();
    assert_eq!(from_first, from_second);
    assert_eq!(to_text(&from_first), "out { v \"a\" v \"b\" }");
}

// ============================================================================
// CLI surface
// ============================================================================

#[cfg(feature = "cli")]
mod cli {
    use sprig_lang::cli::{
        execute_check, execute_run, parse_param, CheckOptions, CliError, RunOptions, RunOutcome,
    };
    use sprig_lang::Value;

    #[test]
    fn test_execute_run_produces_tree_text() {
        let options = RunOptions {
            recipe: "transform { node \"out\" { copy \"item\" } }".to_string(),
            input: Some("doc { item \"a\" }".to_string()),
            params: vec![],
            pretty: false,
        };
        match execute_run(options).unwrap() {
            RunOutcome::Tree(text) => assert_eq!(text, "out { item \"a\" }"),
            RunOutcome::Empty => panic!("expected output"),
        }
    }

    #[test]
    fn test_execute_run_reports_empty() {
        let options = RunOptions {
            recipe: "transform { if \"1 = 2\" { node \"never\" } }".to_string(),
            input: None,
            params: vec![],
            pretty: false,
        };
        assert!(matches!(execute_run(options).unwrap(), RunOutcome::Empty));
    }

    #[test]
    fn test_execute_run_applies_params() {
        let options = RunOptions {
            recipe: "transform { param \"greet\" { select \"'hi'\" } \
                     node \"msg\" { value \"$greet\" } }"
                .to_string(),
            input: None,
            params: vec![("greet".to_string(), Value::Str("hello".to_string()))],
            pretty: false,
        };
        match execute_run(options).unwrap() {
            RunOutcome::Tree(text) => assert_eq!(text, "msg \"hello\""),
            RunOutcome::Empty => panic!("expected output"),
        }
    }

    #[test]
    fn test_execute_check_accepts_and_rejects() {
        let good = CheckOptions {
            recipe: "transform { println \"'ok'\" }".to_string(),
        };
        assert!(execute_check(&good).is_ok());

        let bad = CheckOptions {
            recipe: "transform { widget \"x\" }".to_string(),
        };
        assert!(matches!(execute_check(&bad), Err(CliError::Parse(_))));

        let malformed = CheckOptions {
            recipe: "transform {".to_string(),
        };
        assert!(matches!(execute_check(&malformed), Err(CliError::Read(_))));
    }

    #[test]
    fn test_parse_param_coercions() {
        assert_eq!(parse_param("n=3").unwrap().1, Value::Num(3.0));
        assert_eq!(parse_param("flag=true").unwrap().1, Value::Bool(true));
        assert_eq!(
            parse_param("name=plain text").unwrap().1,
            Value::Str("plain text".to_string())
        );
        assert_eq!(
            parse_param("quoted=\"3\"").unwrap().1,
            Value::Str("3".to_string())
        );
        assert!(matches!(parse_param("no-equals"), Err(CliError::BadParam(_))));
    }
}
