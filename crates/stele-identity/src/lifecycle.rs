//! # Identity Creation and Evolution
//!
//! Both operations are two-phase hash constructions:
//!
//! 1. A *preliminary* composite hash is computed over the body with the
//!    prior lineage attached (empty at creation) and becomes the new
//!    lineage entry's `identityHash`.
//! 2. The signed entry is appended, the composite hash is recomputed
//!    over the body with the extended lineage to become the final `id`,
//!    and the whole identity (including `id`) is signed.
//!
//! The entry hash therefore commits to the state *before* the entry
//! joined the chain, while `id` commits to the state after — which is
//! what makes `parentHash` links meaningful.
//!
//! Evolution never mutates its input; every call returns a fresh value.

use stele_core::Timestamp;
use stele_crypto::KeyPair;
use tracing::debug;

use crate::error::IdentityError;
use crate::identity::{
    compute_capability_manifest_hash, compute_identity_hash, identity_signing_payload,
    lineage_signing_payload, AgentIdentity, ChangeType, Deployment, LineageEntry,
    ModelAttestation,
};
use crate::policy::{carry_forward, EvolutionPolicy};

/// Inputs to [`create_identity`].
#[derive(Debug)]
pub struct CreateIdentityOptions<'a> {
    /// The operator's key pair; signs the lineage entry and the
    /// identity body.
    pub operator_key_pair: &'a KeyPair,
    /// Model attestation.
    pub model: ModelAttestation,
    /// Capability names, in any order; stored sorted.
    pub capabilities: Vec<String>,
    /// Deployment context.
    pub deployment: Deployment,
    /// Optional human-meaningful operator identifier.
    pub operator_identifier: Option<String>,
}

/// Field updates applied during [`evolve_identity`]. Absent fields keep
/// their current values.
#[derive(Debug, Default, Clone)]
pub struct IdentityUpdates {
    /// Replacement model attestation.
    pub model: Option<ModelAttestation>,
    /// Replacement capability list (re-sorted on apply). An empty list
    /// is treated as absent.
    pub capabilities: Option<Vec<String>>,
    /// Replacement deployment context.
    pub deployment: Option<Deployment>,
    /// Replacement operator public key (hex). When absent, the signing
    /// key pair's public key is used.
    pub operator_public_key: Option<String>,
    /// Replacement operator identifier.
    pub operator_identifier: Option<String>,
}

/// Inputs to [`evolve_identity`].
#[derive(Debug)]
pub struct EvolveOptions<'a> {
    /// The key pair signing the new lineage entry and identity body.
    pub operator_key_pair: &'a KeyPair,
    /// The kind of change being recorded.
    pub change_type: ChangeType,
    /// Operator-supplied description of the change.
    pub description: String,
    /// Field updates to apply.
    pub updates: IdentityUpdates,
    /// Override for the reputation carry-forward; when absent the
    /// default [`EvolutionPolicy`] derives it from the change.
    pub reputation_carry_forward: Option<f64>,
}

/// Create a brand-new agent identity with a single `created` lineage
/// entry, version 1, signed by the operator.
pub fn create_identity(
    options: CreateIdentityOptions<'_>,
) -> Result<AgentIdentity, IdentityError> {
    let key_pair = options.operator_key_pair;
    let now = Timestamp::now().to_millis_string();

    let mut capabilities = options.capabilities;
    capabilities.sort();
    let capability_manifest_hash = compute_capability_manifest_hash(&capabilities)?;

    // Phase 1: preliminary hash over the body with an empty lineage.
    let preliminary_hash = compute_identity_hash(
        &key_pair.public_key_hex(),
        &options.model,
        &capability_manifest_hash,
        &options.deployment,
        &[],
    )?;

    let mut entry = LineageEntry {
        identity_hash: preliminary_hash,
        change_type: ChangeType::Created,
        description: "Identity created".to_string(),
        timestamp: now.clone(),
        parent_hash: None,
        reputation_carry_forward: 1.0,
        signature: String::new(),
    };
    entry.signature = key_pair.sign(&lineage_signing_payload(&entry)?).to_hex();

    // Phase 2: final id over the body with the signed entry in place.
    let lineage = vec![entry];
    let id = compute_identity_hash(
        &key_pair.public_key_hex(),
        &options.model,
        &capability_manifest_hash,
        &options.deployment,
        &lineage,
    )?;

    let mut identity = AgentIdentity {
        id,
        operator_public_key: key_pair.public_key_hex(),
        operator_identifier: options.operator_identifier,
        model: options.model,
        capabilities,
        capability_manifest_hash,
        deployment: options.deployment,
        lineage,
        version: 1,
        created_at: now.clone(),
        updated_at: now,
        signature: String::new(),
    };
    identity.signature = key_pair.sign(&identity_signing_payload(&identity)?).to_hex();

    debug!(id = %identity.id, "identity created");
    Ok(identity)
}

/// Evolve an identity by applying updates, extending the lineage, and
/// re-signing. The input identity is not modified.
pub fn evolve_identity(
    identity: &AgentIdentity,
    options: EvolveOptions<'_>,
) -> Result<AgentIdentity, IdentityError> {
    let key_pair = options.operator_key_pair;
    let now = Timestamp::now().to_millis_string();

    let new_model = options
        .updates
        .model
        .clone()
        .unwrap_or_else(|| identity.model.clone());
    let mut new_capabilities = match options
        .updates
        .capabilities
        .as_ref()
        .filter(|caps| !caps.is_empty())
    {
        Some(caps) => caps.clone(),
        None => identity.capabilities.clone(),
    };
    new_capabilities.sort();
    let new_deployment = options
        .updates
        .deployment
        .clone()
        .unwrap_or_else(|| identity.deployment.clone());
    let new_operator_public_key = options
        .updates
        .operator_public_key
        .clone()
        .unwrap_or_else(|| key_pair.public_key_hex());
    let new_operator_identifier = options
        .updates
        .operator_identifier
        .clone()
        .or_else(|| identity.operator_identifier.clone());

    let capability_manifest_hash = compute_capability_manifest_hash(&new_capabilities)?;

    let reputation_carry_forward = options.reputation_carry_forward.unwrap_or_else(|| {
        carry_forward(
            options.change_type,
            identity,
            &options.updates,
            &EvolutionPolicy::default(),
        )
    });

    // Phase 1: preliminary hash over the updated body with the previous
    // lineage still attached.
    let preliminary_hash = compute_identity_hash(
        &new_operator_public_key,
        &new_model,
        &capability_manifest_hash,
        &new_deployment,
        &identity.lineage,
    )?;

    let parent_hash = identity
        .lineage
        .last()
        .map(|entry| entry.identity_hash.clone());

    let mut entry = LineageEntry {
        identity_hash: preliminary_hash,
        change_type: options.change_type,
        description: options.description,
        timestamp: now.clone(),
        parent_hash,
        reputation_carry_forward,
        signature: String::new(),
    };
    entry.signature = key_pair.sign(&lineage_signing_payload(&entry)?).to_hex();

    let mut new_lineage = identity.lineage.clone();
    new_lineage.push(entry);

    // Phase 2: final id over the extended lineage.
    let id = compute_identity_hash(
        &new_operator_public_key,
        &new_model,
        &capability_manifest_hash,
        &new_deployment,
        &new_lineage,
    )?;

    let mut evolved = AgentIdentity {
        id,
        operator_public_key: new_operator_public_key,
        operator_identifier: new_operator_identifier,
        model: new_model,
        capabilities: new_capabilities,
        capability_manifest_hash,
        deployment: new_deployment,
        lineage: new_lineage,
        version: identity.version + 1,
        created_at: identity.created_at.clone(),
        updated_at: now,
        signature: String::new(),
    };
    evolved.signature = key_pair.sign(&identity_signing_payload(&evolved)?).to_hex();

    debug!(
        id = %evolved.id,
        version = evolved.version,
        change = %options.change_type,
        carry_forward = reputation_carry_forward,
        "identity evolved"
    );
    Ok(evolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stele_crypto::verify_bytes;

    fn create_test_identity(key_pair: &KeyPair) -> AgentIdentity {
        create_identity(CreateIdentityOptions {
            operator_key_pair: key_pair,
            model: ModelAttestation::new("anthropic", "claude-3"),
            capabilities: vec!["write".to_string(), "read".to_string()],
            deployment: Deployment::new("container"),
            operator_identifier: Some("op-1".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn create_produces_version_one_with_single_created_entry() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);

        assert_eq!(identity.version, 1);
        assert_eq!(identity.lineage.len(), 1);
        let entry = &identity.lineage[0];
        assert_eq!(entry.change_type, ChangeType::Created);
        assert!(entry.parent_hash.is_none());
        assert_eq!(entry.reputation_carry_forward, 1.0);
        assert_eq!(identity.operator_public_key, kp.public_key_hex());
        assert_eq!(identity.created_at, identity.updated_at);
    }

    #[test]
    fn create_sorts_capabilities() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);
        assert_eq!(identity.capabilities, vec!["read", "write"]);
    }

    #[test]
    fn create_final_id_differs_from_preliminary_entry_hash() {
        // The entry hash covers the empty-lineage body; the id covers
        // the body with the entry in place.
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);
        assert_ne!(identity.id, identity.lineage[0].identity_hash);
    }

    #[test]
    fn create_signatures_verify() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);

        let body = identity_signing_payload(&identity).unwrap();
        let sig = stele_crypto::hex_to_bytes(&identity.signature).unwrap();
        assert!(verify_bytes(body.as_bytes(), &sig, &kp.public_key_bytes()));

        let entry_payload = lineage_signing_payload(&identity.lineage[0]).unwrap();
        let entry_sig = stele_crypto::hex_to_bytes(&identity.lineage[0].signature).unwrap();
        assert!(verify_bytes(
            entry_payload.as_bytes(),
            &entry_sig,
            &kp.public_key_bytes()
        ));
    }

    #[test]
    fn evolve_extends_lineage_and_bumps_version() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);

        let evolved = evolve_identity(
            &identity,
            EvolveOptions {
                operator_key_pair: &kp,
                change_type: ChangeType::CapabilityChange,
                description: "add admin capability".to_string(),
                updates: IdentityUpdates {
                    capabilities: Some(vec![
                        "read".to_string(),
                        "write".to_string(),
                        "admin".to_string(),
                    ]),
                    ..Default::default()
                },
                reputation_carry_forward: None,
            },
        )
        .unwrap();

        assert_eq!(evolved.version, 2);
        assert_eq!(evolved.lineage.len(), 2);
        assert_eq!(
            evolved.lineage[1].parent_hash.as_deref(),
            Some(evolved.lineage[0].identity_hash.as_str())
        );
        assert_eq!(evolved.capabilities, vec!["admin", "read", "write"]);
        assert_eq!(evolved.lineage[1].reputation_carry_forward, 0.90);
        assert_ne!(evolved.id, identity.id);
        assert_eq!(evolved.created_at, identity.created_at);
    }

    #[test]
    fn evolve_does_not_mutate_input() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);
        let snapshot = identity.clone();

        let _ = evolve_identity(
            &identity,
            EvolveOptions {
                operator_key_pair: &kp,
                change_type: ChangeType::ModelUpdate,
                description: "bump model".to_string(),
                updates: IdentityUpdates {
                    model: Some(ModelAttestation::new("anthropic", "claude-4")),
                    ..Default::default()
                },
                reputation_carry_forward: None,
            },
        )
        .unwrap();

        assert_eq!(identity, snapshot);
    }

    #[test]
    fn evolve_applies_policy_rates() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);

        let evolved = evolve_identity(
            &identity,
            EvolveOptions {
                operator_key_pair: &kp,
                change_type: ChangeType::ModelUpdate,
                description: "same family version bump".to_string(),
                updates: IdentityUpdates {
                    model: Some(ModelAttestation::new("anthropic", "claude-3")),
                    ..Default::default()
                },
                reputation_carry_forward: None,
            },
        )
        .unwrap();
        assert_eq!(evolved.lineage[1].reputation_carry_forward, 0.80);
    }

    #[test]
    fn evolve_honors_caller_override() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);

        let evolved = evolve_identity(
            &identity,
            EvolveOptions {
                operator_key_pair: &kp,
                change_type: ChangeType::Fork,
                description: "fork with custom rate".to_string(),
                updates: IdentityUpdates::default(),
                reputation_carry_forward: Some(0.42),
            },
        )
        .unwrap();
        assert_eq!(evolved.lineage[1].reputation_carry_forward, 0.42);
    }

    #[test]
    fn evolve_defaults_operator_key_to_signing_key() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);
        let new_operator = KeyPair::generate();

        let transferred = evolve_identity(
            &identity,
            EvolveOptions {
                operator_key_pair: &new_operator,
                change_type: ChangeType::OperatorTransfer,
                description: "transfer to new operator".to_string(),
                updates: IdentityUpdates::default(),
                reputation_carry_forward: None,
            },
        )
        .unwrap();
        assert_eq!(
            transferred.operator_public_key,
            new_operator.public_key_hex()
        );
    }

    #[test]
    fn evolve_chain_stays_contiguous_over_many_steps() {
        let kp = KeyPair::generate();
        let mut identity = create_test_identity(&kp);

        for i in 0..5 {
            identity = evolve_identity(
                &identity,
                EvolveOptions {
                    operator_key_pair: &kp,
                    change_type: ChangeType::CapabilityChange,
                    description: format!("step {i}"),
                    updates: IdentityUpdates {
                        capabilities: Some(vec![format!("cap-{i}"), "read".to_string()]),
                        ..Default::default()
                    },
                    reputation_carry_forward: None,
                },
            )
            .unwrap();
        }

        assert_eq!(identity.version, 6);
        assert_eq!(identity.lineage.len(), 6);
        for i in 1..identity.lineage.len() {
            assert_eq!(
                identity.lineage[i].parent_hash.as_deref(),
                Some(identity.lineage[i - 1].identity_hash.as_str())
            );
        }
    }

    #[test]
    fn evolve_treats_empty_capability_list_as_absent() {
        let kp = KeyPair::generate();
        let identity = create_test_identity(&kp);

        let evolved = evolve_identity(
            &identity,
            EvolveOptions {
                operator_key_pair: &kp,
                change_type: ChangeType::CapabilityChange,
                description: "no-op capability change".to_string(),
                updates: IdentityUpdates {
                    capabilities: Some(Vec::new()),
                    ..Default::default()
                },
                reputation_carry_forward: None,
            },
        )
        .unwrap();
        assert_eq!(evolved.capabilities, identity.capabilities);
        assert_eq!(evolved.lineage[1].reputation_carry_forward, 0.95);
    }
}
