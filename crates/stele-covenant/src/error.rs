//! # Covenant Error Types

use thiserror::Error;

/// Errors from covenant building, signing, and (de)serialization.
///
/// Verification never returns these: [`verify_covenant`]
/// (crate::verify_covenant) reports failed checks instead of erroring,
/// so a hostile document cannot abort a verifier.
#[derive(Error, Debug)]
pub enum CovenantError {
    /// A builder input failed validation. `field` names the offending
    /// option in wire-format form (e.g. `issuer.publicKey`).
    #[error("{message}")]
    InvalidField {
        /// Dotted path of the invalid option.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The constraints text is not valid CCL.
    #[error("invalid CCL constraints: {0}")]
    InvalidConstraints(#[from] stele_ccl::CclSyntaxError),

    /// The constraints parse but exceed the statement cap.
    #[error("constraints exceed maximum of {max} statements (got {got})")]
    TooManyConstraints {
        /// The cap.
        max: usize,
        /// The observed statement count.
        got: usize,
    },

    /// The serialized document exceeds the size cap.
    #[error("serialized document exceeds maximum size of {max} bytes (got {got})")]
    DocumentTooLarge {
        /// The cap in bytes.
        max: usize,
        /// The observed size in bytes.
        got: usize,
    },

    /// Canonicalization of the document body failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] stele_core::CanonicalizationError),

    /// A cryptographic operation failed.
    #[error("cryptographic error: {0}")]
    Crypto(#[from] stele_crypto::CryptoError),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON string failed structural validation during
    /// deserialization.
    #[error("invalid covenant document: {0}")]
    Deserialize(String),
}

impl CovenantError {
    pub(crate) fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
