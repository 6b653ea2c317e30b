//! Lexical scopes for statement execution.
//!
//! A [`StatementContext`] is one frame of the scope chain: its own
//! variable bindings, the current source context node, and the output
//! node that newly constructed nodes attach to. Child scopes borrow their
//! parent, so the chain's lifetimes mirror the interpreter's call stack
//! and a scope can never outlive the statement that created it.
//!
//! Lookup walks the chain toward the root. Assignment walks the chain
//! too: `variable` reassigns the nearest existing binding in place, and
//! only creates a new binding (in the current scope) when no ancestor has
//! one. Automatic loop variables use [`StatementContext::bind`], which
//! always writes the current scope.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::query::VariableResolver;
use crate::tree::Node;
use crate::value::Value;

/// One frame of the scope chain.
pub struct StatementContext<'a> {
    parent: Option<&'a StatementContext<'a>>,
    variables: RefCell<HashMap<String, Value>>,
    context_node: RefCell<Option<Node>>,
    output_node: Node,
}

impl<'a> StatementContext<'a> {
    /// The root scope of an execution.
    pub fn root(output_node: Node, context_node: Option<Node>) -> Self {
        StatementContext {
            parent: None,
            variables: RefCell::new(HashMap::new()),
            context_node: RefCell::new(context_node),
            output_node,
        }
    }

    /// A child scope: fresh bindings, same context node, same output node.
    pub fn child(&'a self) -> StatementContext<'a> {
        StatementContext {
            parent: Some(self),
            variables: RefCell::new(HashMap::new()),
            context_node: RefCell::new(self.context_node.borrow().clone()),
            output_node: self.output_node.clone(),
        }
    }

    /// A child scope with the output rebound, for `node` bodies.
    pub fn child_with_output(&'a self, output_node: Node) -> StatementContext<'a> {
        StatementContext {
            parent: Some(self),
            variables: RefCell::new(HashMap::new()),
            context_node: RefCell::new(self.context_node.borrow().clone()),
            output_node,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn context_node(&self) -> Option<Node> {
        self.context_node.borrow().clone()
    }

    pub fn set_context_node(&self, node: Node) {
        *self.context_node.borrow_mut() = Some(node);
    }

    pub fn output_node(&self) -> Node {
        self.output_node.clone()
    }

    /// The binding for `name`, searching this scope then its ancestors.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.variables.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.and_then(|p| p.lookup(name))
    }

    /// Whether this scope itself (not an ancestor) binds `name`.
    pub fn has_own(&self, name: &str) -> bool {
        self.variables.borrow().contains_key(name)
    }

    /// Bind `name` in this scope, shadowing any ancestor binding.
    pub fn bind(&self, name: impl Into<String>, value: Value) {
        self.variables.borrow_mut().insert(name.into(), value);
    }

    /// Reassign the nearest existing binding of `name`, or create one in
    /// this scope if no ancestor binds it.
    pub fn assign(&self, name: &str, value: Value) {
        let mut scope = self;
        loop {
            if scope.has_own(name) {
                scope.variables.borrow_mut().insert(name.to_string(), value);
                return;
            }
            match scope.parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        self.bind(name, value);
    }
}

impl VariableResolver for StatementContext<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.lookup(name)
    }
}
