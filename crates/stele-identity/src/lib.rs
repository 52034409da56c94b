#![deny(missing_docs)]

//! # stele-identity — Agent Identity Lineage
//!
//! An agent identity is an append-only, hash-linked, individually-signed
//! evolution chain. Creation produces version 1 with a single `created`
//! lineage entry; every [`evolve_identity`] call appends a signed entry
//! linking to its predecessor, recomputes the composite identity hash,
//! and re-signs the whole document — without mutating the input.
//!
//! Reputation carries across evolutions at a policy-determined rate
//! ([`EvolutionPolicy`]); callers may override it per step.
//!
//! [`verify_identity`] checks the manifest hash, the composite hash,
//! the operator signature, lineage contiguity and timestamp ordering,
//! every lineage entry signature, and the version/lineage-length
//! equality — reporting all outcomes instead of failing fast.

pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod policy;
pub mod verify;
pub mod wire;

pub use error::IdentityError;
pub use identity::{
    compute_capability_manifest_hash, compute_identity_hash, AgentIdentity, ChangeType,
    Deployment, LineageEntry, ModelAttestation,
};
pub use lifecycle::{
    create_identity, evolve_identity, CreateIdentityOptions, EvolveOptions, IdentityUpdates,
};
pub use policy::{carry_forward, EvolutionPolicy};
pub use verify::verify_identity;
pub use wire::{deserialize_identity, serialize_identity};
