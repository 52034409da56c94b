//! # Ed25519 Signing and Verification
//!
//! Wraps `ed25519-dalek` with protocol conventions: signatures and public
//! keys serialize as lowercase hex strings, and the signing input is
//! always [`CanonicalBytes`]; the type system does not offer a raw-byte
//! signing path, so a signature over non-canonical serialization cannot
//! be produced by construction.
//!
//! Verification of *untrusted* material goes through [`verify_bytes`],
//! which accepts arbitrary byte slices and returns a plain `bool`.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use stele_core::CanonicalBytes;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::hex::{bytes_to_hex, hex_to_bytes};

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

/// An Ed25519 signature (64 bytes).
///
/// Serializes as a 128-character lowercase hex string, the form covenant
/// and identity documents carry on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Signature([u8; 64]);

impl Ed25519Signature {
    /// Construct from a raw 64-byte signature.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Construct from a byte slice, validating length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Access the raw 64-byte signature value.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Encode as a lowercase hex string (128 chars).
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Decode from a hex string (128 hex chars → 64 bytes).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(s)?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SigningKey
// ---------------------------------------------------------------------------

/// An Ed25519 signing (private) key.
///
/// Signing input must be `&CanonicalBytes`; raw-byte signing is not
/// exposed. The type does not implement `Serialize`; private keys are
/// exported only through the explicit [`SigningKey::to_bytes()`].
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl SigningKey {
    /// Generate a new random Ed25519 signing key from a CSPRNG.
    pub fn generate<R: rand_core::CryptoRngCore>(csprng: &mut R) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::generate(csprng),
        }
    }

    /// Construct from a raw 32-byte seed.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// Construct from raw key material of 32 or 64 bytes.
    ///
    /// A 64-byte value is treated as a seed-plus-public-key
    /// concatenation; only the leading 32-byte seed is used. Any other
    /// length is rejected.
    pub fn from_key_material(bytes: &[u8]) -> Result<Self, CryptoError> {
        match bytes.len() {
            32 | 64 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(&bytes[..32]);
                let key = Self::from_bytes(&seed);
                seed.zeroize();
                Ok(key)
            }
            other => Err(CryptoError::InvalidPrivateKeyLength(other)),
        }
    }

    /// Derive the corresponding public verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign canonicalized data.
    ///
    /// The input must be `&CanonicalBytes`: the signed payload has passed
    /// through the canonicalization pipeline, so two structurally equal
    /// documents always produce the same signing input.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        let sig = self.inner.sign(data.as_bytes());
        Ed25519Signature(sig.to_bytes())
    }

    /// Export the raw 32-byte seed.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }
}

// Debug must not leak key material.
impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.verifying_key().to_hex())
            .finish()
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        let mut key_bytes = self.inner.to_bytes();
        key_bytes.zeroize();
        self.inner = ed25519_dalek::SigningKey::from_bytes(&[0u8; 32]);
    }
}

// ---------------------------------------------------------------------------
// VerifyingKey
// ---------------------------------------------------------------------------

/// An Ed25519 verifying (public) key.
///
/// Serializes as a 64-character lowercase hex string.
#[derive(Debug, Clone)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

impl VerifyingKey {
    /// Construct from a raw 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Construct from a hex string (64 hex chars → 32 bytes).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(s)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey(format!(
                "expected 32 bytes (64 hex chars), got {} hex chars",
                s.len()
            ))
        })?;
        Self::from_bytes(&arr)
    }

    /// Access the raw 32-byte public key value.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Encode as a lowercase hex string (64 chars).
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.inner.to_bytes())
    }

    /// Verify a signature over canonicalized data.
    ///
    /// This is the typed path for data the caller produced. For
    /// untrusted documents, use [`verify_bytes`].
    pub fn verify(
        &self,
        data: &CanonicalBytes,
        signature: &Ed25519Signature,
    ) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        self.inner
            .verify(data.as_bytes(), &sig)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }
}

impl PartialEq for VerifyingKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for VerifyingKey {}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Untrusted-input verification
// ---------------------------------------------------------------------------

/// Verify an Ed25519 signature over raw message bytes.
///
/// This is the verification path for untrusted documents. It accepts
/// slices of any length and **never panics and never errors**: a
/// wrong-length signature, a wrong-length or non-canonical public key,
/// or an invalid signature all return `false`. Covenant and identity
/// verification depend on this: a hostile document must produce a
/// failed check, not a crash.
pub fn verify_bytes(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let sig_arr: [u8; 64] = match signature.try_into() {
        Ok(arr) => arr,
        Err(_) => return false,
    };
    let pk_arr: [u8; 32] = match public_key.try_into() {
        Ok(arr) => arr,
        Err(_) => return false,
    };
    let vk = match ed25519_dalek::VerifyingKey::from_bytes(&pk_arr) {
        Ok(vk) => vk,
        Err(_) => return false,
    };
    let sig = ed25519_dalek::Signature::from_bytes(&sig_arr);
    vk.verify(message, &sig).is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
