//! Text rendering for labeled trees.
//!
//! This module is the inverse of [`crate::tree::read_str`]: it renders a
//! tree back to the generic `name "value" { children }` form, either
//! compact (single line) or pretty-printed with 2-space indentation.
//!
//! # Examples
//!
//! ```
//! use sprig_lang::tree;
//! use sprig_lang::output::{to_text, to_text_pretty};
//!
//! let node = tree::build("item", Some("first"), vec![]);
//!
//! assert_eq!(to_text(&node), "item \"first\"");
//! assert_eq!(to_text_pretty(&node), "item \"first\"");
//! ```

use crate::tree::Node;

pub struct TreePrinter {
    pretty: bool,
}

impl TreePrinter {
    pub fn new(pretty: bool) -> Self {
        TreePrinter { pretty }
    }

    pub fn print(&self, node: &Node) -> String {
        self.print_node(node, 0)
    }

    fn print_node(&self, node: &Node, indent: usize) -> String {
        let mut result = node.name();

        if let Some(value) = node.value() {
            result.push_str(" \"");
            result.push_str(&self.escape_string(&value));
            result.push('"');
        }

        let children = node.children();
        if children.is_empty() {
            return result;
        }

        if self.pretty {
            result.push_str(" {\n");
            let items: Vec<String> = children
                .iter()
                .map(|c| format!("{}{}", self.indent(indent + 1), self.print_node(c, indent + 1)))
                .collect();
            result.push_str(&items.join("\n"));
            result.push('\n');
            result.push_str(&self.indent(indent));
            result.push('}');
        } else {
            let items: Vec<String> = children.iter().map(|c| self.print_node(c, indent)).collect();
            result.push_str(" { ");
            result.push_str(&items.join(" "));
            result.push_str(" }");
        }
        result
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }

    fn escape_string(&self, s: &str) -> String {
        s.chars()
            .flat_map(|c| match c {
                '"' => vec!['\\', '"'],
                '\\' => vec!['\\', '\\'],
                '\n' => vec!['\\', 'n'],
                '\r' => vec!['\\', 'r'],
                '\t' => vec!['\\', 't'],
                c => vec![c],
            })
            .collect()
    }
}

// Convenience functions

/// Renders a tree to its compact, single-line text representation.
///
/// # Examples
///
/// ```
/// use sprig_lang::tree;
/// use sprig_lang::output::to_text;
///
/// let parent = tree::build("greeting", None, vec![
///     tree::build("message", Some("hello world"), vec![]),
/// ]);
///
/// assert_eq!(to_text(&parent), "greeting { message \"hello world\" }");
/// ```
pub fn to_text(node: &Node) -> String {
    TreePrinter::new(false).print(node)
}

/// Renders a tree to a pretty-printed text representation.
///
/// One child per line, 2-space indentation per level. Reading the output
/// back with [`crate::tree::read_str`] reproduces the tree.
pub fn to_text_pretty(node: &Node) -> String {
    TreePrinter::new(true).print(node)
}
