//! # Identity Error Types

use thiserror::Error;

/// Errors from identity creation, evolution, and (de)serialization.
///
/// Verification never returns these —
/// [`verify_identity`](crate::verify_identity) reports failed checks
/// instead of erroring.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Canonicalization of an identity body or lineage entry failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] stele_core::CanonicalizationError),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON string failed structural validation during
    /// deserialization.
    #[error("invalid identity document: {0}")]
    Deserialize(String),
}
