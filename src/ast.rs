//! # Statement Abstract Syntax Tree
//!
//! This module defines the AST for the recipe statement language: the
//! validated, executable form a raw recipe tree is turned into by the
//! parser.
//!
//! ## Architecture Overview
//!
//! - **[statements]** - the statement variants and their owned parts
//!   (sort specifications, `when` arms)
//! - **[transform]** - the [`Transform`] root and serialization back to
//!   the raw tree / recipe text
//!
//! ## Core Concepts
//!
//! A recipe is a `transform` block containing statements:
//!
//! ```text
//! transform {
//!     param "minimum" { select "'2'" }
//!     node "report" {
//!         foreach "$doc/item[price >= $minimum]" {
//!             sort "name"
//!             node "entry" { value "concat(name, ' #', $position)" }
//!         }
//!     }
//! }
//! ```
//!
//! Statements own their children; the tree is built once by the parser
//! and is read-only during execution. Expressions are kept as text and
//! compiled by the query engine at each evaluation site.

pub mod statements;
pub mod transform;

pub use statements::{SortSpec, Statement, When};
pub use transform::Transform;
