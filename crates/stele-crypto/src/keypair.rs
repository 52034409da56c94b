//! # Key Pairs
//!
//! An operator-facing bundle of a signing key and its derived public key.
//! Covenant issuers, countersigners, and identity operators all hold a
//! [`KeyPair`].

use rand_core::OsRng;
use stele_core::CanonicalBytes;

use crate::ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
use crate::error::CryptoError;

/// An Ed25519 key pair.
///
/// The public half is derived from the private seed, so the two can
/// never disagree.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new key pair from the platform CSPRNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Reconstruct a key pair from an existing 32-byte private key seed.
    ///
    /// The public key is derived deterministically.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPrivateKeyLength`] when the input is
    /// not exactly 32 bytes.
    pub fn from_private_key(private_key: &[u8]) -> Result<Self, CryptoError> {
        let seed: [u8; 32] = private_key
            .try_into()
            .map_err(|_| CryptoError::InvalidPrivateKeyLength(private_key.len()))?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Access the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Derive the verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// The public key as a 64-character lowercase hex string — the form
    /// embedded in documents.
    pub fn public_key_hex(&self) -> String {
        self.verifying_key().to_hex()
    }

    /// The raw 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key().as_bytes()
    }

    /// The raw 32-byte private key seed.
    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign canonicalized data with this pair's private key.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        self.signing_key.sign(data)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key_hex())
            .finish()
    }
}
