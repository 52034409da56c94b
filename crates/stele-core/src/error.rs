//! # Error Types
//!
//! Structured errors for the foundational layer, built with `thiserror`.
//! Each variant carries enough context to diagnose the failure without a
//! debugger.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Serde serialization to a JSON value failed (e.g. a map with
    /// non-string keys).
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A timestamp string failed to parse as ISO 8601 / RFC 3339.
#[derive(Error, Debug)]
#[error("invalid timestamp: \"{value}\" ({reason})")]
pub struct TimestampParseError {
    /// The string that failed to parse.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}
