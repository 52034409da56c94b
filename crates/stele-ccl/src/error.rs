//! # CCL Error Types

use thiserror::Error;

/// A syntax error in CCL source text, with its 1-indexed source position.
///
/// Positions point at the offending token. Errors produced before any
/// token exists (empty input) report line 1, column 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("CCL syntax error at line {line}, column {column}: {message}")]
pub struct CclSyntaxError {
    /// What went wrong, phrased for the policy author.
    pub message: String,
    /// 1-indexed source line.
    pub line: u32,
    /// 1-indexed source column.
    pub column: u32,
}

impl CclSyntaxError {
    /// Construct a syntax error at the given source position.
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}
