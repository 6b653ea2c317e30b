//! Statement variants of the recipe language.

/// One executable statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Construct an output node
    ///
    /// # Example
    /// ```text
    /// node "message" { value "'hello world'" }
    /// ```
    Node {
        name: String,
        value: Option<String>,
        body: Vec<Statement>,
    },

    /// Deep-copy selected source nodes into the output
    ///
    /// # Example
    /// ```text
    /// copy "$doc/item"
    /// ```
    Copy { select: String },

    /// Write a string to the sink
    ///
    /// # Example
    /// ```text
    /// println "concat('processing ', name)"
    /// ```
    Print { value: String, newline: bool },

    /// Iterate a selected node-set
    ///
    /// Leading `sort` children are comparator specs, not executed
    /// statements; they are consumed before iteration begins.
    ///
    /// # Example
    /// ```text
    /// foreach "$doc/item" {
    ///     sort "price" { reverse "true()" }
    ///     copy "."
    /// }
    /// ```
    ForEach {
        select: String,
        sorts: Vec<SortSpec>,
        body: Vec<Statement>,
    },

    /// A free-standing sort spec; inert when executed directly.
    ///
    /// The parser only ever attaches sorts to their owning `foreach`;
    /// this variant exists so a hand-constructed tree still walks.
    Sort(SortSpec),

    /// Conditional body
    ///
    /// # Example
    /// ```text
    /// if "count(item) > 3" { println "'large'" }
    /// ```
    If { test: String, body: Vec<Statement> },

    /// First-true dispatch
    ///
    /// # Example
    /// ```text
    /// choose {
    ///     when "price > 10" { node "expensive" }
    ///     otherwise { node "cheap" }
    /// }
    /// ```
    Choose {
        whens: Vec<When>,
        otherwise: Option<Vec<Statement>>,
    },

    /// Bind or reassign a variable
    ///
    /// # Example
    /// ```text
    /// variable "total" { select "$total + price" }
    /// ```
    Variable { name: String, select: String },

    /// Declare a caller-overridable parameter (transform root only)
    ///
    /// # Example
    /// ```text
    /// param "minimum" { select "'2'" }
    /// ```
    Param { name: String, select: String },
}

/// One sort key of a `foreach`: primary first, then tie-breakers in
/// declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    /// Key expression, evaluated per item as a string
    pub key: String,
    /// Optional expression; a true result reverses this key
    pub reverse: Option<String>,
    /// Optional comparator expression with two `?` placeholders
    pub comparator: Option<String>,
}

/// One `when` arm of a `choose`.
#[derive(Debug, Clone, PartialEq)]
pub struct When {
    pub test: String,
    pub body: Vec<Statement>,
}

impl Statement {
    /// The statement's keyword, for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Statement::Node { .. } => "node",
            Statement::Copy { .. } => "copy",
            Statement::Print { newline: false, .. } => "print",
            Statement::Print { newline: true, .. } => "println",
            Statement::ForEach { .. } => "foreach",
            Statement::Sort(_) => "sort",
            Statement::If { .. } => "if",
            Statement::Choose { .. } => "choose",
            Statement::Variable { .. } => "variable",
            Statement::Param { .. } => "param",
        }
    }
}
