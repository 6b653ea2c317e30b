//! Validate recipes without executing them

use super::CliError;
use crate::ast::Transform;
use crate::{parser, tree};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The recipe text to validate
    pub recipe: String,
}

/// Read and validate a recipe, returning the Transform it builds.
pub fn execute_check(options: &CheckOptions) -> Result<Transform, CliError> {
    let raw = tree::read_str(&options.recipe)?;
    let transform = parser::parse(&raw)?;
    Ok(transform)
}
