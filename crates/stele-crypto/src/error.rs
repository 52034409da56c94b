//! # Crypto Error Types

use thiserror::Error;

/// Errors from cryptographic operations.
///
/// Note that [`verify_bytes`](crate::verify_bytes) never returns these —
/// the untrusted-input verification path maps every failure to `false`.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Hex decoding failed (odd length or non-hex characters).
    #[error("hex decode error: {0}")]
    HexDecode(String),

    /// A signature was not exactly 64 bytes.
    #[error("invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// A public key was malformed (wrong length or not a valid curve
    /// point).
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A private key had an unsupported length. 32-byte seeds are the
    /// norm; 64-byte seed-plus-public concatenations are accepted where
    /// documented.
    #[error("invalid private key length: expected 32 bytes, got {0}")]
    InvalidPrivateKeyLength(usize),

    /// Signature verification failed on the typed path.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),
}
