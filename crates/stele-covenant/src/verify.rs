//! # Covenant Verification
//!
//! Eleven named checks over an untrusted document. Every check runs even
//! when earlier ones fail — the caller sees the complete report and
//! decides which failures matter. Nothing in here panics or errors on
//! hostile input: malformed hex, unparseable timestamps, and bad
//! signatures all surface as failed checks.

use chrono::Utc;
use stele_core::{Check, Report, Timestamp};
use stele_crypto::{constant_time_equal, hex_to_bytes, verify_bytes};
use tracing::debug;

use crate::document::{
    CovenantDocument, MAX_CHAIN_DEPTH, MAX_CONSTRAINTS, MAX_DOCUMENT_SIZE,
    VALID_ENFORCEMENT_TYPES, VALID_PROOF_TYPES,
};

/// Verify a covenant document, running all eleven checks.
///
/// | # | name | condition |
/// |---|------|-----------|
/// | 1 | `id_match` | id equals SHA-256 of the canonical form |
/// | 2 | `signature_valid` | issuer signature verifies over the canonical form |
/// | 3 | `not_expired` | `expiresAt` absent or in the future |
/// | 4 | `active` | `activatesAt` absent or in the past |
/// | 5 | `ccl_parses` | constraints parse with at most 256 statements |
/// | 6 | `enforcement_valid` | absent or recognized type tag |
/// | 7 | `proof_valid` | absent or recognized type tag |
/// | 8 | `chain_depth` | absent or depth in 1..=16 |
/// | 9 | `document_size` | serialized size at most 1 MiB |
/// | 10 | `countersignatures` | every countersignature verifies |
/// | 11 | `nonce_present` | nonce is 64 hex chars |
pub fn verify_covenant(doc: &CovenantDocument) -> Report {
    let mut checks = Vec::with_capacity(11);

    checks.push(check_id_match(doc));
    checks.push(check_signature(doc));
    checks.push(check_not_expired(doc));
    checks.push(check_active(doc));
    checks.push(check_ccl_parses(doc));
    checks.push(check_enforcement(doc));
    checks.push(check_proof(doc));
    checks.push(check_chain_depth(doc));
    checks.push(check_document_size(doc));
    checks.push(check_countersignatures(doc));
    checks.push(check_nonce(doc));

    for check in checks.iter().filter(|c| !c.passed) {
        debug!(check = %check.name, message = %check.message, "covenant check failed");
    }

    Report::from_checks(checks)
}

fn check_id_match(doc: &CovenantDocument) -> Check {
    match doc.compute_id() {
        Ok(expected) => {
            let passed = constant_time_equal(doc.id.as_bytes(), expected.as_bytes());
            let message = if passed {
                "Document ID matches canonical hash".to_string()
            } else {
                format!("ID mismatch: expected {expected}, got {}", doc.id)
            };
            Check::new("id_match", passed, message)
        }
        Err(e) => Check::new("id_match", false, format!("canonicalization failed: {e}")),
    }
}

fn check_signature(doc: &CovenantDocument) -> Check {
    let passed = signature_over_canonical_form(doc, &doc.signature, &doc.issuer.public_key);
    let message = if passed {
        "Issuer signature is valid"
    } else {
        "Issuer signature verification failed"
    };
    Check::new("signature_valid", passed, message)
}

/// Decode hex signature and key, then verify over the canonical form.
/// Any malformed input yields `false`.
fn signature_over_canonical_form(
    doc: &CovenantDocument,
    signature_hex: &str,
    public_key_hex: &str,
) -> bool {
    let Ok(canonical) = doc.canonical_form() else {
        return false;
    };
    let Ok(signature) = hex_to_bytes(signature_hex) else {
        return false;
    };
    let Ok(public_key) = hex_to_bytes(public_key_hex) else {
        return false;
    };
    verify_bytes(canonical.as_bytes(), &signature, &public_key)
}

fn check_not_expired(doc: &CovenantDocument) -> Check {
    match &doc.expires_at {
        None => Check::new("not_expired", true, "No expiry set"),
        Some(expires_at) => match Timestamp::parse(expires_at) {
            Ok(expires) => {
                let passed = Utc::now() < *expires.as_datetime();
                let message = if passed {
                    "Document has not expired".to_string()
                } else {
                    format!("Document expired at {expires_at}")
                };
                Check::new("not_expired", passed, message)
            }
            Err(_) => Check::new(
                "not_expired",
                false,
                format!("Unparseable expiresAt: {expires_at}"),
            ),
        },
    }
}

fn check_active(doc: &CovenantDocument) -> Check {
    match &doc.activates_at {
        None => Check::new("active", true, "No activation time set"),
        Some(activates_at) => match Timestamp::parse(activates_at) {
            Ok(activates) => {
                let passed = Utc::now() >= *activates.as_datetime();
                let message = if passed {
                    "Document is active".to_string()
                } else {
                    format!("Document activates at {activates_at}")
                };
                Check::new("active", passed, message)
            }
            Err(_) => Check::new(
                "active",
                false,
                format!("Unparseable activatesAt: {activates_at}"),
            ),
        },
    }
}

fn check_ccl_parses(doc: &CovenantDocument) -> Check {
    match stele_ccl::parse(&doc.constraints) {
        Ok(parsed) if parsed.statements().len() > MAX_CONSTRAINTS => Check::new(
            "ccl_parses",
            false,
            format!("Constraints exceed maximum of {MAX_CONSTRAINTS} statements"),
        ),
        Ok(parsed) => Check::new(
            "ccl_parses",
            true,
            format!(
                "CCL parsed successfully ({} statement(s))",
                parsed.statements().len()
            ),
        ),
        Err(e) => Check::new("ccl_parses", false, format!("CCL parse error: {e}")),
    }
}

fn check_enforcement(doc: &CovenantDocument) -> Check {
    match &doc.enforcement {
        None => Check::new("enforcement_valid", true, "No enforcement config present"),
        Some(enforcement) => {
            let passed = VALID_ENFORCEMENT_TYPES.contains(&enforcement.config_type.as_str());
            let message = if passed {
                format!("Enforcement type '{}' is valid", enforcement.config_type)
            } else {
                format!("Unknown enforcement type '{}'", enforcement.config_type)
            };
            Check::new("enforcement_valid", passed, message)
        }
    }
}

fn check_proof(doc: &CovenantDocument) -> Check {
    match &doc.proof {
        None => Check::new("proof_valid", true, "No proof config present"),
        Some(proof) => {
            let passed = VALID_PROOF_TYPES.contains(&proof.config_type.as_str());
            let message = if passed {
                format!("Proof type '{}' is valid", proof.config_type)
            } else {
                format!("Unknown proof type '{}'", proof.config_type)
            };
            Check::new("proof_valid", passed, message)
        }
    }
}

fn check_chain_depth(doc: &CovenantDocument) -> Check {
    match &doc.chain {
        None => Check::new("chain_depth", true, "No chain reference present"),
        Some(chain) => {
            let passed = (1..=MAX_CHAIN_DEPTH).contains(&chain.depth);
            let message = if passed {
                format!("Chain depth {} is within limit", chain.depth)
            } else {
                format!(
                    "Chain depth {} exceeds maximum of {MAX_CHAIN_DEPTH}",
                    chain.depth
                )
            };
            Check::new("chain_depth", passed, message)
        }
    }
}

fn check_document_size(doc: &CovenantDocument) -> Check {
    let size = serde_json::to_string(doc).map(|s| s.len()).unwrap_or(0);
    let passed = size <= MAX_DOCUMENT_SIZE;
    let message = if passed {
        format!("Document size {size} bytes is within limit")
    } else {
        format!("Document size {size} bytes exceeds maximum of {MAX_DOCUMENT_SIZE}")
    };
    Check::new("document_size", passed, message)
}

fn check_countersignatures(doc: &CovenantDocument) -> Check {
    if doc.countersignatures.is_empty() {
        return Check::new("countersignatures", true, "No countersignatures present");
    }

    let mut failed_signers: Vec<String> = Vec::new();
    for cs in &doc.countersignatures {
        if !signature_over_canonical_form(doc, &cs.signature, &cs.signer_public_key) {
            let prefix: String = cs.signer_public_key.chars().take(16).collect();
            failed_signers.push(format!("{prefix}..."));
        }
    }

    if failed_signers.is_empty() {
        Check::new(
            "countersignatures",
            true,
            format!(
                "All {} countersignature(s) are valid",
                doc.countersignatures.len()
            ),
        )
    } else {
        Check::new(
            "countersignatures",
            false,
            format!(
                "Invalid countersignature(s) from: {}",
                failed_signers.join(", ")
            ),
        )
    }
}

fn check_nonce(doc: &CovenantDocument) -> Check {
    let nonce = &doc.nonce;
    // 64 hex chars of either case; the builder emits lowercase only.
    let passed = nonce.len() == 64 && nonce.chars().all(|c| c.is_ascii_hexdigit());
    let message = if passed {
        "Nonce is present and valid (64-char hex)".to_string()
    } else if nonce.is_empty() {
        "Nonce is missing or empty".to_string()
    } else {
        format!(
            "Nonce is malformed: expected 64-char hex string, got {} chars",
            nonce.len()
        )
    };
    Check::new("nonce_present", passed, message)
}
