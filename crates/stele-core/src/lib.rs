#![deny(missing_docs)]

//! # stele-core — Foundational Types for the Stele Protocol
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde`, `serde_json`,
//! `thiserror`, `chrono`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **[`CanonicalBytes`] is the sole path to digest and signature input.**
//!    Every hash and every signature in the protocol is computed over bytes
//!    produced by `CanonicalBytes::new()`, which applies JCS canonicalization
//!    with the protocol's null-dropping rule.
//!
//! 2. **Verification reports, not exceptions.** Verifiers return a
//!    [`Report`] listing every check with its outcome; a failed check never
//!    aborts the remaining checks.
//!
//! 3. **Structured errors with `thiserror`.** No `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod report;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::{canonicalize_json, CanonicalBytes};
pub use digest::{is_sha256_hex, sha256_hex, sha256_object};
pub use error::{CanonicalizationError, TimestampParseError};
pub use report::{Check, Report};
pub use temporal::Timestamp;
