//! The statement keyword registry.
//!
//! A static table describing every recipe keyword: whether it must be a
//! leaf or must have children, and which parent keywords may contain it.
//! The table is built once and consulted only by the parser; the
//! interpreter never looks at it.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Structural constraints for one keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordDescriptor {
    pub tag: &'static str,

    /// Some(true): leaf only. Some(false): must have children.
    /// None: either shape is allowed.
    pub leaf: Option<bool>,

    /// Keywords this one may appear under. None means any statement
    /// context; the empty slice means root only.
    pub parents: Option<&'static [&'static str]>,
}

pub const TRANSFORM: &str = "transform";
pub const NODE: &str = "node";
pub const VALUE: &str = "value";
pub const COPY: &str = "copy";
pub const PRINT: &str = "print";
pub const PRINTLN: &str = "println";
pub const FOREACH: &str = "foreach";
pub const SORT: &str = "sort";
pub const REVERSE: &str = "reverse";
pub const COMPARATOR: &str = "comparator";
pub const IF: &str = "if";
pub const CHOOSE: &str = "choose";
pub const WHEN: &str = "when";
pub const OTHERWISE: &str = "otherwise";
pub const VARIABLE: &str = "variable";
pub const PARAM: &str = "param";
pub const SELECT: &str = "select";

static KEYWORDS: Lazy<HashMap<&'static str, KeywordDescriptor>> = Lazy::new(|| {
    let table = [
        KeywordDescriptor { tag: TRANSFORM, leaf: Some(false), parents: Some(&[]) },
        KeywordDescriptor { tag: NODE, leaf: None, parents: None },
        KeywordDescriptor { tag: VALUE, leaf: Some(true), parents: Some(&[NODE]) },
        KeywordDescriptor { tag: COPY, leaf: Some(true), parents: None },
        KeywordDescriptor { tag: PRINT, leaf: Some(true), parents: None },
        KeywordDescriptor { tag: PRINTLN, leaf: Some(true), parents: None },
        KeywordDescriptor { tag: FOREACH, leaf: Some(false), parents: None },
        KeywordDescriptor { tag: SORT, leaf: None, parents: Some(&[FOREACH]) },
        KeywordDescriptor { tag: REVERSE, leaf: Some(true), parents: Some(&[SORT]) },
        KeywordDescriptor { tag: COMPARATOR, leaf: Some(true), parents: Some(&[SORT]) },
        KeywordDescriptor { tag: IF, leaf: Some(false), parents: None },
        KeywordDescriptor { tag: CHOOSE, leaf: Some(false), parents: None },
        KeywordDescriptor { tag: WHEN, leaf: Some(false), parents: Some(&[CHOOSE]) },
        KeywordDescriptor { tag: OTHERWISE, leaf: Some(false), parents: Some(&[CHOOSE]) },
        // Either shape, so an absent mandatory 'select' is reported as
        // missing rather than as a shape violation
        KeywordDescriptor { tag: VARIABLE, leaf: None, parents: None },
        KeywordDescriptor { tag: PARAM, leaf: None, parents: Some(&[TRANSFORM]) },
        KeywordDescriptor { tag: SELECT, leaf: Some(true), parents: Some(&[VARIABLE, PARAM]) },
    ];
    table.into_iter().map(|d| (d.tag, d)).collect()
});

/// Look up a keyword; None for tags outside the statement language.
pub fn describe(tag: &str) -> Option<&'static KeywordDescriptor> {
    KEYWORDS.get(tag)
}

impl KeywordDescriptor {
    /// Whether this keyword may appear under the given parent tag.
    pub fn allows_parent(&self, parent: &str) -> bool {
        match self.parents {
            None => true,
            Some(parents) => parents.contains(&parent),
        }
    }
}
