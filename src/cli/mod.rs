//! CLI support for sprig-lang
//!
//! Provides programmatic access to the sprig CLI functionality for
//! embedding in other tools.

mod check;
mod run;

pub use check::{execute_check, CheckOptions};
pub use run::{execute_run, parse_param, RunOptions, RunOutcome};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// The recipe or input document is not well-formed tree text
    Read(crate::tree::ReadError),
    /// The recipe violates the statement grammar
    Parse(crate::ParseError),
    /// Execution failure
    Transform(crate::TransformError),
    /// IO error
    Io(io::Error),
    /// A --param argument that is not NAME=VALUE
    BadParam(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Read(e) => write!(f, "Read error: {}", e),
            CliError::Parse(e) => write!(f, "Parse error: {}", e),
            CliError::Transform(e) => write!(f, "Transform error: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::BadParam(spec) => {
                write!(f, "Invalid parameter '{}': expected NAME=VALUE", spec)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Read(e) => Some(e),
            CliError::Parse(e) => Some(e),
            CliError::Transform(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::BadParam(_) => None,
        }
    }
}

impl From<crate::tree::ReadError> for CliError {
    fn from(e: crate::tree::ReadError) -> Self {
        CliError::Read(e)
    }
}

impl From<crate::ParseError> for CliError {
    fn from(e: crate::ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<crate::TransformError> for CliError {
    fn from(e: crate::TransformError) -> Self {
        CliError::Transform(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
