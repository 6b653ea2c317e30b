//! Expression nodes for the path-query language.

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

/// A parsed path-query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    ///
    /// # Example
    /// ```text
    /// 3.5
    /// ```
    Number(f64),

    /// String literal, single or double quoted
    ///
    /// # Example
    /// ```text
    /// 'hello world'
    /// ```
    Literal(String),

    /// Variable reference
    ///
    /// # Example
    /// ```text
    /// $position
    /// ```
    Variable(String),

    /// Location path
    ///
    /// # Examples
    /// ```text
    /// item/name
    /// $s/item[price > 2]
    /// .
    /// ```
    Path(PathExpr),

    /// Function call
    ///
    /// # Example
    /// ```text
    /// starts-with(name, 'a')
    /// ```
    FunctionCall { name: String, args: Vec<Expr> },

    /// Binary operation
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary minus
    Negate(Box<Expr>),
}

/// Where a location path starts.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStart {
    /// The context node (a relative path, or `.`)
    Context,
    /// A node-valued variable (`$doc/item`)
    Variable(String),
}

/// One child step of a location path.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub test: NameTest,
    pub predicates: Vec<Expr>,
}

/// What a step matches among the children of the current node-set.
#[derive(Debug, Clone, PartialEq)]
pub enum NameTest {
    /// Children with this exact name
    Name(String),
    /// Any child (`*`)
    Any,
}

/// A location path: a start point plus zero or more child steps.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub start: PathStart,
    pub steps: Vec<Step>,
}
