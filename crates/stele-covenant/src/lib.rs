#![deny(missing_docs)]

//! # stele-covenant — Signed, Delegatable Policy Documents
//!
//! A covenant binds an issuer's policy (CCL constraints) to a
//! beneficiary agent under an Ed25519 signature. The document's identity
//! is `SHA-256(canonical form)`, where the canonical form strips `id`,
//! `signature`, and `countersignatures` before JCS serialization — so
//! the id commits to exactly what the signature covers, and third-party
//! countersignatures never disturb either.
//!
//! ## Lifecycle
//!
//! - [`build_covenant`] validates inputs, signs, and returns a document
//!   that passes all verification checks immediately.
//! - [`countersign_covenant`] appends an independent third-party
//!   signature, returning a new document.
//! - [`verify_covenant`] runs eleven named checks over an untrusted
//!   document and reports every outcome without short-circuiting.
//! - [`validate_chain_narrowing`] checks that a delegated covenant only
//!   restricts its parent's policy.
//! - [`serialize_covenant`] / [`deserialize_covenant`] move documents
//!   on and off the wire with eager structural validation.

pub mod builder;
pub mod chain;
pub mod document;
pub mod error;
pub mod verify;
pub mod wire;

pub use builder::{build_covenant, countersign_covenant, CovenantOptions};
pub use chain::{validate_chain_narrowing, ChainNarrowingResult, ChainViolation, RuleRef};
pub use document::{
    ChainRef, Countersignature, CovenantDocument, EnforcementConfig, Party, ProofConfig,
    MAX_CHAIN_DEPTH, MAX_CONSTRAINTS, MAX_DOCUMENT_SIZE, PROTOCOL_VERSION,
    VALID_ENFORCEMENT_TYPES, VALID_PROOF_TYPES,
};
pub use error::CovenantError;
pub use verify::verify_covenant;
pub use wire::{deserialize_covenant, serialize_covenant};
