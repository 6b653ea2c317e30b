// tests/reader_tests.rs

use sprig_lang::output::{to_text, to_text_pretty};
use sprig_lang::tree::{self, Node};

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_read_leaf_with_value() {
    let node = tree::read_str("item \"first\"").unwrap();
    assert_eq!(node.name(), "item");
    assert_eq!(node.value(), Some("first".to_string()));
    assert_eq!(node.child_count(), 0);
}

#[test]
fn test_read_nested() {
    let node = tree::read_str("doc { item \"a\" item { price \"2\" } }").unwrap();
    assert_eq!(node.name(), "doc");
    assert_eq!(node.child_count(), 2);

    let children = node.children();
    assert_eq!(children[0].value(), Some("a".to_string()));
    assert_eq!(children[1].children()[0].name(), "price");
}

#[test]
fn test_read_multiline_with_comments() {
    let text = r#"
        # a catalog
        catalog {
            item "pear"   # trailing comment
            item "plum"
        }
    "#;
    let node = tree::read_str(text).unwrap();
    assert_eq!(node.name(), "catalog");
    assert_eq!(node.child_count(), 2);
    assert_eq!(node.children()[1].value(), Some("plum".to_string()));
}

#[test]
fn test_read_escapes() {
    let node = tree::read_str(r#"msg "a\"b\\c\nd""#).unwrap();
    assert_eq!(node.value(), Some("a\"b\\c\nd".to_string()));
}

#[test]
fn test_read_namespaced_name() {
    let node = tree::read_str("ns:local \"v\"").unwrap();
    assert_eq!(node.name(), "ns:local");
}

#[test]
fn test_read_rejects_invalid_name() {
    let err = tree::read_str("1st \"v\"").unwrap_err();
    assert!(err.message.contains("node name"));
}

#[test]
fn test_read_rejects_unterminated_string() {
    let err = tree::read_str("item \"open").unwrap_err();
    assert!(err.message.contains("unterminated"));
}

#[test]
fn test_read_rejects_missing_brace() {
    let err = tree::read_str("doc { item \"a\"").unwrap_err();
    assert!(err.message.contains("expected '}'"));
}

#[test]
fn test_read_rejects_trailing_input() {
    let err = tree::read_str("a \"1\" b \"2\"").unwrap_err();
    assert!(err.message.contains("after the root node"));
}

#[test]
fn test_read_reports_position() {
    let err = tree::read_str("doc {\n  item \"a\"\n  ?\n}").unwrap_err();
    assert_eq!(err.position.line, 3);
}

#[test]
fn test_read_rejects_unknown_escape() {
    let err = tree::read_str(r#"item "a\qb""#).unwrap_err();
    assert!(err.message.contains("escape"));
}

// ============================================================================
// Writing
// ============================================================================

#[test]
fn test_write_compact() {
    let node = tree::build(
        "doc",
        None,
        vec![
            tree::build("item", Some("a"), vec![]),
            tree::build("item", None, vec![tree::build("price", Some("2"), vec![])]),
        ],
    );
    assert_eq!(
        to_text(&node),
        "doc { item \"a\" item { price \"2\" } }"
    );
}

#[test]
fn test_write_pretty() {
    let node = tree::build(
        "doc",
        None,
        vec![tree::build("item", Some("a"), vec![])],
    );
    assert_eq!(to_text_pretty(&node), "doc {\n  item \"a\"\n}");
}

#[test]
fn test_write_escapes() {
    let node = tree::build("msg", Some("a\"b\\c\nd"), vec![]);
    assert_eq!(to_text(&node), r#"msg "a\"b\\c\nd""#);
}

#[test]
fn test_write_then_read_is_identity() {
    let original = tree::read_str(
        "catalog { item { name \"pear\" price \"3\" } item { name \"fig\" } note \"x y\" }",
    )
    .unwrap();

    let compact = tree::read_str(&to_text(&original)).unwrap();
    assert_eq!(compact, original);

    let pretty = tree::read_str(&to_text_pretty(&original)).unwrap();
    assert_eq!(pretty, original);
}

// ============================================================================
// Node semantics
// ============================================================================

#[test]
fn test_string_value_concatenates_descendants() {
    let node = tree::read_str("doc { a \"x\" b { c \"y\" } }").unwrap();
    assert_eq!(node.string_value(), "xy");
}

#[test]
fn test_string_value_prefers_own_value() {
    let node = tree::read_str("doc \"own\"").unwrap();
    assert_eq!(node.string_value(), "own");
}

#[test]
fn test_deep_clone_is_independent() {
    let original = tree::read_str("doc { item \"a\" }").unwrap();
    let copy = original.deep_clone();
    assert_eq!(copy, original);
    assert!(!copy.same_node(&original));

    copy.children()[0].set_value(Some("changed".to_string()));
    assert_eq!(original.children()[0].value(), Some("a".to_string()));
}

#[test]
fn test_handles_share_the_node() {
    let node = Node::new("doc");
    let alias = node.clone();
    alias.append(Node::new("child"));
    assert_eq!(node.child_count(), 1);
    assert!(alias.same_node(&node));
}

#[test]
fn test_take_children_empties_the_node() {
    let node = tree::read_str("doc { a \"1\" b \"2\" }").unwrap();
    let children = node.take_children();
    assert_eq!(children.len(), 2);
    assert_eq!(node.child_count(), 0);
}
