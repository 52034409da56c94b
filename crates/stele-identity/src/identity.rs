//! # Agent Identity Model
//!
//! An agent identity binds an operator key to a model attestation, a
//! capability manifest, and a deployment context. Its `id` is a
//! composite hash over those identity-defining fields *including the
//! lineage chain*, so any evolution necessarily produces a new id.
//!
//! ## Lineage
//!
//! The lineage is append-only and hash-linked: each entry records the
//! identity hash it produced, links to the previous entry's hash, and
//! carries its own operator signature. The first entry's `parentHash`
//! is an explicit `null` on the wire (and absent from canonical form,
//! where null members are dropped).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stele_core::{sha256_object, CanonicalBytes};

use crate::error::IdentityError;

/// The kind of change a lineage entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Initial creation; always the first and only the first entry.
    Created,
    /// The model attestation changed.
    ModelUpdate,
    /// The capability list changed.
    CapabilityChange,
    /// The identity moved to a different operator.
    OperatorTransfer,
    /// The identity was forked from an existing one.
    Fork,
    /// The identity merged lines of evolution.
    Merge,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::ModelUpdate => "model_update",
            Self::CapabilityChange => "capability_change",
            Self::OperatorTransfer => "operator_transfer",
            Self::Fork => "fork",
            Self::Merge => "merge",
        };
        f.write_str(s)
    }
}

/// Attestation of the model behind an agent. `provider` and `modelId`
/// are the identity-relevant core; any additional attestation fields
/// (version tags, weights digests, ...) ride along untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAttestation {
    /// Model provider (e.g. `"anthropic"`).
    pub provider: String,
    /// Provider-scoped model identifier.
    #[serde(rename = "modelId")]
    pub model_id: String,
    /// Additional attestation fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ModelAttestation {
    /// An attestation with only the core fields set.
    pub fn new(provider: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_id: model_id.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// The deployment context an agent runs in. `runtime` is required;
/// environment-specific fields ride along untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Runtime environment (e.g. `"container"`).
    pub runtime: String,
    /// Additional deployment fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Deployment {
    /// A deployment context with only the runtime set.
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// One link in the identity's evolution chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEntry {
    /// The composite hash this evolution step produced (computed over
    /// the body with the *previous* lineage attached).
    #[serde(rename = "identityHash")]
    pub identity_hash: String,
    /// What kind of change this entry records.
    #[serde(rename = "changeType")]
    pub change_type: ChangeType,
    /// Operator-supplied description of the change.
    pub description: String,
    /// When the change happened (ISO 8601, milliseconds).
    pub timestamp: String,
    /// The previous entry's `identityHash`; `null` for the first entry.
    /// Serialized explicitly (not skipped) so the wire form is stable;
    /// canonicalization drops the null.
    #[serde(rename = "parentHash", default)]
    pub parent_hash: Option<String>,
    /// Fraction of reputation carried across this change, in `[0, 1]`.
    #[serde(rename = "reputationCarryForward")]
    pub reputation_carry_forward: f64,
    /// Operator signature over this entry (minus the signature itself).
    pub signature: String,
}

/// A complete agent identity document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentIdentity {
    /// Composite identity hash, 64 hex chars.
    pub id: String,
    /// The operator's Ed25519 public key, 64 hex chars.
    #[serde(rename = "operatorPublicKey")]
    pub operator_public_key: String,
    /// Optional human-meaningful operator identifier.
    #[serde(
        rename = "operatorIdentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub operator_identifier: Option<String>,
    /// Model attestation.
    pub model: ModelAttestation,
    /// Capability names, lexicographically sorted.
    pub capabilities: Vec<String>,
    /// SHA-256 of the canonical JSON of the sorted capability list.
    #[serde(rename = "capabilityManifestHash")]
    pub capability_manifest_hash: String,
    /// Deployment context.
    pub deployment: Deployment,
    /// Evolution chain, oldest first.
    pub lineage: Vec<LineageEntry>,
    /// Version number; always equals the lineage length.
    pub version: u32,
    /// Creation time (ISO 8601, milliseconds).
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Last evolution time (ISO 8601, milliseconds).
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    /// Operator signature over the identity body including `id`,
    /// excluding this field.
    pub signature: String,
}

/// Compute the capability manifest hash: capabilities sorted
/// lexicographically, canonical-JSON serialized, SHA-256 hashed.
pub fn compute_capability_manifest_hash(
    capabilities: &[String],
) -> Result<String, IdentityError> {
    let mut sorted: Vec<&String> = capabilities.iter().collect();
    sorted.sort();
    Ok(sha256_object(&sorted)?)
}

/// Compute the composite identity hash over the identity-defining
/// fields: operator key, model attestation, capability manifest hash,
/// deployment context, and the full lineage chain.
pub fn compute_identity_hash(
    operator_public_key: &str,
    model: &ModelAttestation,
    capability_manifest_hash: &str,
    deployment: &Deployment,
    lineage: &[LineageEntry],
) -> Result<String, IdentityError> {
    let composite = serde_json::json!({
        "operatorPublicKey": operator_public_key,
        "model": model,
        "capabilityManifestHash": capability_manifest_hash,
        "deployment": deployment,
        "lineage": lineage,
    });
    Ok(sha256_object(&composite)?)
}

/// The canonical signing payload of an identity: the full document
/// including `id`, with `signature` removed.
pub(crate) fn identity_signing_payload(
    identity: &AgentIdentity,
) -> Result<CanonicalBytes, IdentityError> {
    let mut value = serde_json::to_value(identity)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("signature");
    }
    Ok(CanonicalBytes::from_value(value))
}

/// The canonical signing payload of a lineage entry: the entry with its
/// `signature` removed.
pub(crate) fn lineage_signing_payload(
    entry: &LineageEntry,
) -> Result<CanonicalBytes, IdentityError> {
    let mut value = serde_json::to_value(entry)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("signature");
    }
    Ok(CanonicalBytes::from_value(value))
}
