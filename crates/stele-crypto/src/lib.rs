#![deny(missing_docs)]

//! # stele-crypto — Cryptographic Primitives
//!
//! Ed25519 signing and verification, key pairs, hex encoding, nonce
//! generation, and constant-time comparison for the Stele protocol.
//!
//! ## Two verification paths
//!
//! - [`VerifyingKey::verify`] is the typed path: it takes
//!   [`CanonicalBytes`](stele_core::CanonicalBytes) and a typed signature,
//!   and returns a structured error on failure.
//! - [`verify_bytes`] is the untrusted-input path: it takes raw byte
//!   slices of any length and returns a plain `bool`. It never panics and
//!   never errors — covenant and identity verification run on untrusted
//!   documents, and a malformed key or signature must surface as a failed
//!   check, not a crash.

pub mod compare;
pub mod ed25519;
pub mod error;
pub mod hex;
pub mod keypair;
pub mod nonce;

pub use compare::constant_time_equal;
pub use ed25519::{verify_bytes, Ed25519Signature, SigningKey, VerifyingKey};
pub use error::CryptoError;
pub use hex::{bytes_to_hex, hex_to_bytes};
pub use keypair::KeyPair;
pub use nonce::{generate_nonce, generate_nonce_hex};
