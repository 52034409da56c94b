//! # Identity Verification
//!
//! Six named checks over an untrusted identity document. Every check
//! runs; none throws. Malformed hex or unverifiable signatures surface
//! as failed checks.

use stele_core::{Check, Report};
use stele_crypto::{constant_time_equal, hex_to_bytes, verify_bytes};
use tracing::debug;

use crate::identity::{
    compute_capability_manifest_hash, compute_identity_hash, identity_signing_payload,
    lineage_signing_payload, AgentIdentity,
};

/// Verify all cryptographic and structural invariants of an identity.
///
/// | # | name | condition |
/// |---|------|-----------|
/// | 1 | `capability_manifest_hash` | matches recomputation from sorted capabilities |
/// | 2 | `composite_identity_hash` | `id` matches recomputation over the body |
/// | 3 | `operator_signature` | full-body signature verifies under the operator key |
/// | 4 | `lineage_chain` | parent-hash links contiguous, timestamps non-decreasing |
/// | 5 | `lineage_signatures` | every entry's signature verifies under the operator key |
/// | 6 | `version_lineage_match` | `version` equals the lineage length |
pub fn verify_identity(identity: &AgentIdentity) -> Report {
    let mut checks = Vec::with_capacity(6);

    checks.push(check_manifest_hash(identity));
    checks.push(check_composite_hash(identity));
    checks.push(check_operator_signature(identity));
    checks.push(check_lineage_chain(identity));
    checks.push(check_lineage_signatures(identity));
    checks.push(check_version(identity));

    for check in checks.iter().filter(|c| !c.passed) {
        debug!(check = %check.name, message = %check.message, "identity check failed");
    }

    Report::from_checks(checks)
}

fn check_manifest_hash(identity: &AgentIdentity) -> Check {
    match compute_capability_manifest_hash(&identity.capabilities) {
        Ok(expected) => {
            let passed = constant_time_equal(
                expected.as_bytes(),
                identity.capability_manifest_hash.as_bytes(),
            );
            let message = if passed {
                "Capability manifest hash is valid".to_string()
            } else {
                format!(
                    "Capability manifest hash mismatch: expected {expected}, got {}",
                    identity.capability_manifest_hash
                )
            };
            Check::new("capability_manifest_hash", passed, message)
        }
        Err(e) => Check::new(
            "capability_manifest_hash",
            false,
            format!("hash computation failed: {e}"),
        ),
    }
}

fn check_composite_hash(identity: &AgentIdentity) -> Check {
    let recomputed = compute_identity_hash(
        &identity.operator_public_key,
        &identity.model,
        &identity.capability_manifest_hash,
        &identity.deployment,
        &identity.lineage,
    );
    match recomputed {
        Ok(expected) => {
            let passed = constant_time_equal(expected.as_bytes(), identity.id.as_bytes());
            let message = if passed {
                "Composite identity hash is valid".to_string()
            } else {
                format!(
                    "Composite identity hash mismatch: expected {expected}, got {}",
                    identity.id
                )
            };
            Check::new("composite_identity_hash", passed, message)
        }
        Err(e) => Check::new(
            "composite_identity_hash",
            false,
            format!("hash computation failed: {e}"),
        ),
    }
}

fn check_operator_signature(identity: &AgentIdentity) -> Check {
    let passed = (|| {
        let payload = identity_signing_payload(identity).ok()?;
        let signature = hex_to_bytes(&identity.signature).ok()?;
        let public_key = hex_to_bytes(&identity.operator_public_key).ok()?;
        Some(verify_bytes(payload.as_bytes(), &signature, &public_key))
    })()
    .unwrap_or(false);

    let message = if passed {
        "Operator signature is valid"
    } else {
        "Operator signature verification failed"
    };
    Check::new("operator_signature", passed, message)
}

fn check_lineage_chain(identity: &AgentIdentity) -> Check {
    for (i, entry) in identity.lineage.iter().enumerate() {
        if i == 0 {
            if let Some(parent) = &entry.parent_hash {
                return Check::new(
                    "lineage_chain",
                    false,
                    format!("Lineage entry 0: expected null parentHash, got {parent}"),
                );
            }
        } else {
            let prev = &identity.lineage[i - 1];
            if entry.parent_hash.as_deref() != Some(prev.identity_hash.as_str()) {
                return Check::new(
                    "lineage_chain",
                    false,
                    format!(
                        "Lineage entry {i}: parentHash {} does not match previous identityHash {}",
                        entry.parent_hash.as_deref().unwrap_or("null"),
                        prev.identity_hash
                    ),
                );
            }
            // Millisecond ISO 8601 strings sort chronologically.
            if entry.timestamp < prev.timestamp {
                return Check::new(
                    "lineage_chain",
                    false,
                    format!(
                        "Lineage entry {i}: timestamp {} is before previous {}",
                        entry.timestamp, prev.timestamp
                    ),
                );
            }
        }
    }
    Check::new("lineage_chain", true, "Lineage chain is consistent")
}

fn check_lineage_signatures(identity: &AgentIdentity) -> Check {
    for (i, entry) in identity.lineage.iter().enumerate() {
        let valid = (|| {
            let payload = lineage_signing_payload(entry).ok()?;
            let signature = hex_to_bytes(&entry.signature).ok()?;
            let public_key = hex_to_bytes(&identity.operator_public_key).ok()?;
            Some(verify_bytes(payload.as_bytes(), &signature, &public_key))
        })()
        .unwrap_or(false);

        if !valid {
            return Check::new(
                "lineage_signatures",
                false,
                format!("Lineage entry {i}: signature verification failed"),
            );
        }
    }
    Check::new(
        "lineage_signatures",
        true,
        "All lineage entry signatures are valid",
    )
}

fn check_version(identity: &AgentIdentity) -> Check {
    let passed = identity.version as usize == identity.lineage.len();
    let message = if passed {
        "Version matches lineage length".to_string()
    } else {
        format!(
            "Version {} does not match lineage length {}",
            identity.version,
            identity.lineage.len()
        )
    };
    Check::new("version_lineage_match", passed, message)
}
