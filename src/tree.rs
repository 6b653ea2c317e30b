//! Labeled tree model and the generic text form.
//!
//! A [`Node`] is a shared handle to a labeled tree node: a name, an
//! optional string value, and an ordered list of children. Handles are
//! cheap to clone and refer to the same underlying node, which is what
//! lets the interpreter hand an output attachment point down through
//! nested scopes.
//!
//! The generic text form is what recipes and source documents are written
//! in before any statement-level validation happens:
//!
//! ```text
//! catalog {
//!     item "first"   # a leaf with a value
//!     item {
//!         price "2"
//!     }
//! }
//! ```
//!
//! [`read_str`] turns that into a raw tree; the `output` module renders a
//! tree back to text.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*(:[A-Za-z_][A-Za-z0-9_.\-]*)?$").unwrap()
});

/// Check a node name against the naming rule.
///
/// Names start with a letter or underscore, continue with letters, digits,
/// `_`, `.` or `-`, and may contain a single `:` namespace separator
/// between two such parts.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

#[derive(Debug)]
struct NodeData {
    name: String,
    value: Option<String>,
    children: Vec<Node>,
}

/// A shared handle to a labeled tree node.
///
/// Cloning a `Node` clones the handle, not the node; use
/// [`Node::deep_clone`] for a structural copy.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    /// Create a node with no value and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Node(Rc::new(RefCell::new(NodeData {
            name: name.into(),
            value: None,
            children: Vec::new(),
        })))
    }

    /// Create a node carrying a value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let node = Node::new(name);
        node.set_value(Some(value.into()));
        node
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn value(&self) -> Option<String> {
        self.0.borrow().value.clone()
    }

    pub fn set_value(&self, value: Option<String>) {
        self.0.borrow_mut().value = value;
    }

    /// Append a child handle.
    pub fn append(&self, child: Node) {
        self.0.borrow_mut().children.push(child);
    }

    /// Handles to the children, in document order.
    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.borrow().children.is_empty()
    }

    /// Remove and return all children, leaving the node empty.
    pub fn take_children(&self) -> Vec<Node> {
        std::mem::take(&mut self.0.borrow_mut().children)
    }

    /// Children whose name equals `name`, in document order.
    pub fn children_named(&self, name: &str) -> Vec<Node> {
        self.0
            .borrow()
            .children
            .iter()
            .filter(|c| c.name() == name)
            .cloned()
            .collect()
    }

    /// Structural copy: a fresh tree equal to this one.
    pub fn deep_clone(&self) -> Node {
        let data = self.0.borrow();
        let copy = Node::new(data.name.clone());
        copy.set_value(data.value.clone());
        for child in &data.children {
            copy.append(child.deep_clone());
        }
        copy
    }

    /// The node's string value: its own value if set, otherwise the
    /// concatenation of its descendants' values in document order.
    pub fn string_value(&self) -> String {
        let data = self.0.borrow();
        if let Some(v) = &data.value {
            return v.clone();
        }
        let mut out = String::new();
        for child in &data.children {
            out.push_str(&child.string_value());
        }
        out
    }

    /// Whether two handles refer to the same underlying node.
    pub fn same_node(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Node {
    /// Structural equality: same name, value, and children.
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        let a = self.0.borrow();
        let b = other.0.borrow();
        a.name == b.name && a.value == b.value && a.children == b.children
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        write!(f, "{}", data.name)?;
        if let Some(v) = &data.value {
            write!(f, " {:?}", v)?;
        }
        if !data.children.is_empty() {
            write!(f, " {:?}", data.children)?;
        }
        Ok(())
    }
}

/// Position of a character in the input text, for reader diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Errors produced while reading the generic text form.
#[derive(Debug, Clone)]
pub struct ReadError {
    pub message: String,
    pub position: Position,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.message, self.position.line, self.position.column
        )
    }
}

impl std::error::Error for ReadError {}

struct Reader {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Reader {
    fn new(input: &str) -> Self {
        Reader {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        if let Some('\n') = self.current_char() {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, message: impl Into<String>) -> ReadError {
        ReadError {
            message: message.into(),
            position: self.here(),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                // Line comment
                while let Some(c) = self.current_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_name(&mut self) -> Result<String, ReadError> {
        let start = self.here();
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | ':') {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if result.is_empty() {
            return Err(self.error(match self.current_char() {
                Some(c) => format!("expected a node name, found '{}'", c),
                None => "expected a node name, found end of input".to_string(),
            }));
        }
        if !is_valid_name(&result) {
            return Err(ReadError {
                message: format!("invalid node name '{}'", result),
                position: start,
            });
        }
        Ok(result)
    }

    fn read_string(&mut self) -> Result<String, ReadError> {
        let open = self.here();
        self.advance(); // opening quote
        let mut result = String::new();
        loop {
            match self.current_char() {
                None => {
                    return Err(ReadError {
                        message: "unterminated string".to_string(),
                        position: open,
                    });
                }
                Some('"') => {
                    self.advance();
                    return Ok(result);
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.current_char() {
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some(c) => {
                            return Err(self.error(format!("unknown escape '\\{}'", c)));
                        }
                        None => {
                            return Err(ReadError {
                                message: "unterminated string".to_string(),
                                position: open,
                            });
                        }
                    };
                    result.push(escaped);
                    self.advance();
                }
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }
    }

    fn read_node(&mut self) -> Result<Node, ReadError> {
        let name = self.read_name()?;
        let node = Node::new(name);

        self.skip_trivia();
        if self.current_char() == Some('"') {
            node.set_value(Some(self.read_string()?));
            self.skip_trivia();
        }

        if self.current_char() == Some('{') {
            self.advance();
            loop {
                self.skip_trivia();
                match self.current_char() {
                    Some('}') => {
                        self.advance();
                        break;
                    }
                    Some(_) => node.append(self.read_node()?),
                    None => return Err(self.error("unexpected end of input, expected '}'")),
                }
            }
        }

        Ok(node)
    }
}

/// Read a single tree from its generic text form.
pub fn read_str(text: &str) -> Result<Node, ReadError> {
    let mut reader = Reader::new(text);
    reader.skip_trivia();
    let node = reader.read_node()?;
    reader.skip_trivia();
    if let Some(c) = reader.current_char() {
        return Err(reader.error(format!("unexpected '{}' after the root node", c)));
    }
    Ok(node)
}

/// Build a node from parts, for tests and tree construction by hand.
pub fn build(name: &str, value: Option<&str>, children: Vec<Node>) -> Node {
    let node = Node::new(name);
    node.set_value(value.map(str::to_string));
    for child in children {
        node.append(child);
    }
    node
}

#[test]
fn test_name_rule() {
    assert!(is_valid_name("greeting"));
    assert!(is_valid_name("_x-1.y"));
    assert!(is_valid_name("ns:local"));
    assert!(!is_valid_name(""));
    assert!(!is_valid_name("1st"));
    assert!(!is_valid_name("a:b:c"));
    assert!(!is_valid_name("spaced name"));
}

#[test]
fn test_read_simple() {
    let node = read_str("item \"first\"").unwrap();
    assert_eq!(node.name(), "item");
    assert_eq!(node.value(), Some("first".to_string()));
    assert!(node.is_leaf());
}
