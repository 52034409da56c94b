//! # Covenant Builder and Countersigning
//!
//! Building validates every input eagerly, parses the constraints to
//! catch CCL errors before anything is signed, then derives the
//! canonical form, signs it, and sets `id = SHA-256(canonical form)`.
//! The returned document passes all verification checks immediately.

use stele_ccl::parse;
use stele_core::Timestamp;
use stele_crypto::{generate_nonce_hex, KeyPair, SigningKey};
use tracing::debug;

use crate::document::{
    ChainRef, Countersignature, CovenantDocument, EnforcementConfig, Party, ProofConfig,
    MAX_CHAIN_DEPTH, MAX_CONSTRAINTS, MAX_DOCUMENT_SIZE, PROTOCOL_VERSION,
    VALID_ENFORCEMENT_TYPES, VALID_PROOF_TYPES,
};
use crate::error::CovenantError;

/// Inputs to [`build_covenant`].
#[derive(Debug)]
pub struct CovenantOptions {
    /// The issuing party; `role` must be `"issuer"`.
    pub issuer: Party,
    /// The authorized party; `role` must be `"beneficiary"`.
    pub beneficiary: Party,
    /// CCL source text; must parse and hold at most
    /// [`MAX_CONSTRAINTS`] statements.
    pub constraints: String,
    /// The issuer's Ed25519 private key: a 32-byte seed, or a 64-byte
    /// seed-plus-public concatenation (only the seed is used).
    pub private_key: Vec<u8>,
    /// Free-form obligation descriptions.
    pub obligations: Option<serde_json::Value>,
    /// Delegation-chain reference; `depth` must be in `1..=16`.
    pub chain: Option<ChainRef>,
    /// Enforcement configuration; the type tag must be recognized.
    pub enforcement: Option<EnforcementConfig>,
    /// Proof configuration; the type tag must be recognized.
    pub proof: Option<ProofConfig>,
    /// Revocation metadata.
    pub revocation: Option<serde_json::Value>,
    /// Application metadata.
    pub metadata: Option<serde_json::Value>,
    /// Expiry time (ISO 8601).
    pub expires_at: Option<String>,
    /// Activation time (ISO 8601).
    pub activates_at: Option<String>,
}

impl CovenantOptions {
    /// Options with only the required inputs set.
    pub fn new(
        issuer: Party,
        beneficiary: Party,
        constraints: impl Into<String>,
        private_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            issuer,
            beneficiary,
            constraints: constraints.into(),
            private_key: private_key.into(),
            obligations: None,
            chain: None,
            enforcement: None,
            proof: None,
            revocation: None,
            metadata: None,
            expires_at: None,
            activates_at: None,
        }
    }
}

/// Build a new, signed covenant document.
///
/// # Errors
///
/// Returns [`CovenantError`] when any input is missing or invalid, the
/// constraints fail to parse or exceed the statement cap, or the
/// finished document exceeds [`MAX_DOCUMENT_SIZE`].
pub fn build_covenant(options: CovenantOptions) -> Result<CovenantDocument, CovenantError> {
    validate_party(&options.issuer, "issuer")?;
    validate_party(&options.beneficiary, "beneficiary")?;

    if options.constraints.trim().is_empty() {
        return Err(CovenantError::invalid_field(
            "constraints",
            "constraints is required. Provide a CCL string, e.g.: permit read on '/data/**'",
        ));
    }

    if !matches!(options.private_key.len(), 32 | 64) {
        return Err(CovenantError::invalid_field(
            "privateKey",
            format!(
                "privateKey must be 32 or 64 bytes (Ed25519), got {} bytes",
                options.private_key.len()
            ),
        ));
    }
    let signing_key = SigningKey::from_key_material(&options.private_key)?;

    // Parse constraints up front so a malformed policy never gets
    // signed.
    let parsed = parse(&options.constraints)?;
    if parsed.statements().len() > MAX_CONSTRAINTS {
        return Err(CovenantError::TooManyConstraints {
            max: MAX_CONSTRAINTS,
            got: parsed.statements().len(),
        });
    }

    if let Some(chain) = &options.chain {
        validate_chain_ref(chain)?;
    }

    if let Some(enforcement) = &options.enforcement {
        if !VALID_ENFORCEMENT_TYPES.contains(&enforcement.config_type.as_str()) {
            return Err(CovenantError::invalid_field(
                "enforcement.type",
                format!("invalid enforcement type: {}", enforcement.config_type),
            ));
        }
    }

    if let Some(proof) = &options.proof {
        if !VALID_PROOF_TYPES.contains(&proof.config_type.as_str()) {
            return Err(CovenantError::invalid_field(
                "proof.type",
                format!("invalid proof type: {}", proof.config_type),
            ));
        }
    }

    let mut doc = CovenantDocument {
        id: String::new(),
        version: PROTOCOL_VERSION.to_string(),
        issuer: options.issuer,
        beneficiary: options.beneficiary,
        constraints: options.constraints,
        nonce: generate_nonce_hex(),
        created_at: Timestamp::now().to_millis_string(),
        signature: String::new(),
        obligations: options.obligations,
        chain: options.chain,
        enforcement: options.enforcement,
        proof: options.proof,
        revocation: options.revocation,
        metadata: options.metadata,
        expires_at: options.expires_at,
        activates_at: options.activates_at,
        countersignatures: Vec::new(),
    };

    // The canonical form excludes id and signature, so computing it on
    // the placeholder-bearing document is exact.
    let canonical = doc.canonical_form()?;
    doc.signature = signing_key.sign(&canonical).to_hex();
    doc.id = stele_core::sha256_hex(canonical.as_bytes());

    let serialized = serde_json::to_string(&doc)?;
    if serialized.len() > MAX_DOCUMENT_SIZE {
        return Err(CovenantError::DocumentTooLarge {
            max: MAX_DOCUMENT_SIZE,
            got: serialized.len(),
        });
    }

    debug!(id = %doc.id, statements = parsed.statements().len(), "covenant built");
    Ok(doc)
}

/// Add a countersignature to a covenant.
///
/// The countersigner signs the canonical form, which excludes existing
/// countersignatures, so each countersignature is independent of every
/// other and of the order they were added in. Returns a new document;
/// the input is not mutated.
pub fn countersign_covenant(
    doc: &CovenantDocument,
    signer: &KeyPair,
    signer_role: impl Into<String>,
) -> Result<CovenantDocument, CovenantError> {
    let canonical = doc.canonical_form()?;
    let signature = signer.sign(&canonical);

    let mut countersigned = doc.clone();
    countersigned.countersignatures.push(Countersignature {
        signer_public_key: signer.public_key_hex(),
        signer_role: signer_role.into(),
        signature: signature.to_hex(),
        timestamp: Timestamp::now().to_millis_string(),
    });

    Ok(countersigned)
}

fn validate_party(party: &Party, field: &str) -> Result<(), CovenantError> {
    if party.id.is_empty() {
        return Err(CovenantError::invalid_field(
            &format!("{field}.id"),
            format!("{field}.id is required"),
        ));
    }
    if party.public_key.is_empty() {
        return Err(CovenantError::invalid_field(
            &format!("{field}.publicKey"),
            format!("{field}.publicKey is required (hex-encoded Ed25519 public key)"),
        ));
    }
    if party.role != field {
        return Err(CovenantError::invalid_field(
            &format!("{field}.role"),
            format!("{field}.role must be \"{field}\""),
        ));
    }
    Ok(())
}

fn validate_chain_ref(chain: &ChainRef) -> Result<(), CovenantError> {
    if chain.parent_id.is_empty() {
        return Err(CovenantError::invalid_field(
            "chain.parentId",
            "chain.parentId is required",
        ));
    }
    if chain.relation.is_empty() {
        return Err(CovenantError::invalid_field(
            "chain.relation",
            "chain.relation is required",
        ));
    }
    if chain.depth < 1 {
        return Err(CovenantError::invalid_field(
            "chain.depth",
            "chain.depth must be a positive integer",
        ));
    }
    if chain.depth > MAX_CHAIN_DEPTH {
        return Err(CovenantError::invalid_field(
            "chain.depth",
            format!(
                "chain.depth exceeds maximum of {MAX_CHAIN_DEPTH} (got {})",
                chain.depth
            ),
        ));
    }
    Ok(())
}
