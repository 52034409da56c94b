//! # Covenant Document Model
//!
//! The covenant envelope is rigid (`deny_unknown_fields`): an unknown
//! field would be silently dropped on deserialization and change the
//! canonical form, corrupting the document's hash identity. Open-ended
//! content lives in the designated extensible fields (`obligations`,
//! `revocation`, `metadata`, and the enforcement/proof `config`).
//!
//! ## Canonical form
//!
//! The canonical form of a covenant is the document with `id`,
//! `signature`, and `countersignatures` removed, JCS-serialized. The
//! issuer signature and the document id are both computed over it, and
//! every countersignature independently signs the *same* bytes — so
//! countersignatures never chain and never affect the id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stele_core::{sha256_hex, CanonicalBytes};

use crate::error::CovenantError;

/// The protocol version every covenant carries.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Maximum number of CCL statements a covenant's constraints may hold.
pub const MAX_CONSTRAINTS: usize = 256;

/// Maximum delegation chain depth.
pub const MAX_CHAIN_DEPTH: u64 = 16;

/// Maximum serialized document size in bytes (1 MiB).
pub const MAX_DOCUMENT_SIZE: usize = 1_048_576;

/// Recognized enforcement configuration type tags.
pub const VALID_ENFORCEMENT_TYPES: [&str; 5] =
    ["capability", "monitor", "audit", "bond", "composite"];

/// Recognized proof configuration type tags.
pub const VALID_PROOF_TYPES: [&str; 6] = [
    "tee",
    "capability_manifest",
    "audit_log",
    "bond_reference",
    "zkp",
    "composite",
];

/// A covenant party: the issuer or the beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Party {
    /// Stable party identifier (application-defined).
    pub id: String,
    /// The party's Ed25519 public key, 64 hex chars.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Fixed role tag: `"issuer"` or `"beneficiary"`.
    pub role: String,
}

impl Party {
    /// Construct an issuer party.
    pub fn issuer(id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public_key: public_key.into(),
            role: "issuer".to_string(),
        }
    }

    /// Construct a beneficiary party.
    pub fn beneficiary(id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public_key: public_key.into(),
            role: "beneficiary".to_string(),
        }
    }
}

/// A reference to a parent covenant in a delegation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainRef {
    /// The parent covenant's document id.
    #[serde(rename = "parentId")]
    pub parent_id: String,
    /// How this covenant relates to its parent (e.g. `"delegation"`).
    pub relation: String,
    /// Depth of this covenant in the chain, 1-based.
    pub depth: u64,
}

/// Declares how constraint compliance is enforced. Only the type tag is
/// validated here; the config payload belongs to the enforcement
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnforcementConfig {
    /// Enforcement backend tag; see [`VALID_ENFORCEMENT_TYPES`].
    #[serde(rename = "type")]
    pub config_type: String,
    /// Backend-specific configuration, opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// Declares what evidence backs the covenant. Only the type tag is
/// validated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProofConfig {
    /// Proof mechanism tag; see [`VALID_PROOF_TYPES`].
    #[serde(rename = "type")]
    pub config_type: String,
    /// Mechanism-specific configuration, opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// A third-party signature over the covenant's canonical form.
///
/// Countersignatures sign the same bytes as the issuer, so they are
/// independent of one another: adding or reordering them never
/// invalidates anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Countersignature {
    /// The countersigner's Ed25519 public key, 64 hex chars.
    #[serde(rename = "signerPublicKey")]
    pub signer_public_key: String,
    /// The countersigner's role (application-defined, e.g.
    /// `"auditor"`).
    #[serde(rename = "signerRole")]
    pub signer_role: String,
    /// Ed25519 signature over the canonical form, 128 hex chars.
    pub signature: String,
    /// When the countersignature was added (ISO 8601, milliseconds).
    pub timestamp: String,
}

/// A signed, delegatable policy document authorizing agent actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CovenantDocument {
    /// SHA-256 of the canonical form, 64 hex chars.
    pub id: String,
    /// Protocol version; always [`PROTOCOL_VERSION`].
    pub version: String,
    /// The issuing party.
    pub issuer: Party,
    /// The party the covenant authorizes.
    pub beneficiary: Party,
    /// CCL source text.
    pub constraints: String,
    /// 32 random bytes as 64 hex chars.
    pub nonce: String,
    /// Creation time (ISO 8601, milliseconds, UTC).
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Issuer's Ed25519 signature over the canonical form, 128 hex
    /// chars.
    pub signature: String,

    /// Free-form obligation descriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obligations: Option<Value>,
    /// Delegation-chain reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<ChainRef>,
    /// Enforcement configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<EnforcementConfig>,
    /// Proof configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofConfig>,
    /// Revocation metadata, opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<Value>,
    /// Application metadata, opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Expiry time (ISO 8601); absent means the covenant never expires.
    #[serde(rename = "expiresAt", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Activation time (ISO 8601); absent means immediately active.
    #[serde(
        rename = "activatesAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub activates_at: Option<String>,
    /// Third-party countersignatures; omitted from the wire when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countersignatures: Vec<Countersignature>,
}

impl CovenantDocument {
    /// Compute the canonical form: the document without `id`,
    /// `signature`, and `countersignatures`, JCS-serialized.
    pub fn canonical_form(&self) -> Result<CanonicalBytes, CovenantError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("id");
            obj.remove("signature");
            obj.remove("countersignatures");
        }
        Ok(CanonicalBytes::from_value(value))
    }

    /// Compute the document id: SHA-256 hex of the canonical form.
    pub fn compute_id(&self) -> Result<String, CovenantError> {
        Ok(sha256_hex(self.canonical_form()?.as_bytes()))
    }
}
