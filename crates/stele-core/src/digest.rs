//! # SHA-256 Digest Computation
//!
//! All SHA-256 computation in the protocol flows through this module.
//! No other crate imports `sha2` directly. Digests are lowercase hex
//! strings because that is the form documents carry on the wire
//! (`id`, `capabilityManifestHash`, lineage `identityHash`).

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::CanonicalizationError;

/// Compute the SHA-256 digest of raw bytes as a 64-character lowercase
/// hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute the SHA-256 digest of a value in canonical JSON form.
///
/// The value is serialized via [`CanonicalBytes`] (sorted keys, dropped
/// null members, compact separators), then hashed. Two structurally equal
/// values always produce the same digest regardless of key insertion
/// order.
///
/// # Errors
///
/// Returns [`CanonicalizationError`] if the value cannot be serialized.
pub fn sha256_object(value: &impl Serialize) -> Result<String, CanonicalizationError> {
    let canonical = CanonicalBytes::new(value)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Check whether a string is a valid SHA-256 hex digest: exactly 64
/// lowercase hex characters.
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64
        && s.chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
