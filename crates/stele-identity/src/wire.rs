//! # Identity Wire Serialization
//!
//! Identities serialize to *canonical* JSON (unlike covenants, whose
//! wire form is non-canonical compact JSON): the original wire format
//! hashes serialized identities directly, so the serialized form must
//! be deterministic. Deserialization validates the presence and JSON
//! types of every required field before typed decoding.

use serde_json::Value;

use crate::error::IdentityError;
use crate::identity::AgentIdentity;

/// Required top-level fields of a serialized identity.
const REQUIRED_FIELDS: [&str; 11] = [
    "id",
    "operatorPublicKey",
    "model",
    "capabilities",
    "capabilityManifestHash",
    "deployment",
    "lineage",
    "version",
    "createdAt",
    "updatedAt",
    "signature",
];

/// Serialize an identity to a canonical (deterministic) JSON string.
pub fn serialize_identity(identity: &AgentIdentity) -> Result<String, IdentityError> {
    Ok(stele_core::canonicalize_json(identity)?)
}

/// Deserialize and structurally validate an identity document.
///
/// # Errors
///
/// Returns [`IdentityError::Deserialize`] when the input is empty or
/// malformed JSON, any required field is missing, or a field has the
/// wrong JSON type.
pub fn deserialize_identity(json_str: &str) -> Result<AgentIdentity, IdentityError> {
    if json_str.trim().is_empty() {
        return Err(IdentityError::Deserialize(
            "input is empty; expected a JSON identity document".to_string(),
        ));
    }

    let parsed: Value = serde_json::from_str(json_str)
        .map_err(|e| IdentityError::Deserialize(format!("invalid JSON: {e}")))?;

    let obj = parsed
        .as_object()
        .ok_or_else(|| IdentityError::Deserialize("expected a JSON object".to_string()))?;

    for field in REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            return Err(IdentityError::Deserialize(format!(
                "missing required field \"{field}\""
            )));
        }
    }

    if !obj["lineage"].is_array() {
        return Err(IdentityError::Deserialize(
            "lineage must be an array".to_string(),
        ));
    }
    if !obj["capabilities"].is_array() {
        return Err(IdentityError::Deserialize(
            "capabilities must be an array".to_string(),
        ));
    }
    if !obj["version"].is_number() {
        return Err(IdentityError::Deserialize(
            "version must be a number".to_string(),
        ));
    }

    serde_json::from_value(parsed).map_err(|e| IdentityError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Deployment, ModelAttestation};
    use crate::lifecycle::{create_identity, CreateIdentityOptions};
    use crate::verify::verify_identity;
    use stele_crypto::KeyPair;

    fn fresh_identity() -> AgentIdentity {
        let kp = KeyPair::generate();
        create_identity(CreateIdentityOptions {
            operator_key_pair: &kp,
            model: ModelAttestation::new("anthropic", "claude-3"),
            capabilities: vec!["read".to_string()],
            deployment: Deployment::new("container"),
            operator_identifier: None,
        })
        .unwrap()
    }

    #[test]
    fn roundtrip_preserves_identity_and_verifiability() {
        let identity = fresh_identity();
        let json = serialize_identity(&identity).unwrap();
        let back = deserialize_identity(&json).unwrap();
        assert_eq!(identity, back);
        assert!(verify_identity(&back).valid);
    }

    #[test]
    fn serialization_is_deterministic() {
        let identity = fresh_identity();
        assert_eq!(
            serialize_identity(&identity).unwrap(),
            serialize_identity(&identity).unwrap()
        );
    }

    #[test]
    fn serialized_form_has_sorted_keys_and_no_null_members() {
        let identity = fresh_identity();
        let json = serialize_identity(&identity).unwrap();
        // The canonical form drops the first entry's null parentHash.
        assert!(!json.contains("parentHash"));
        // Keys are sorted: capabilities before version.
        let caps_pos = json.find("capabilities").unwrap();
        let version_pos = json.find("version").unwrap();
        assert!(caps_pos < version_pos);
    }

    #[test]
    fn rejects_empty_input() {
        for src in ["", "   "] {
            let err = deserialize_identity(src).unwrap_err();
            assert!(err.to_string().contains("empty"));
        }
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(deserialize_identity("{oops").is_err());
    }

    #[test]
    fn rejects_non_object() {
        assert!(deserialize_identity("[]").is_err());
    }

    #[test]
    fn rejects_missing_required_fields() {
        let identity = fresh_identity();
        for field in REQUIRED_FIELDS {
            let mut value = serde_json::to_value(&identity).unwrap();
            value.as_object_mut().unwrap().remove(field);
            let err = deserialize_identity(&value.to_string()).unwrap_err();
            assert!(err.to_string().contains(field), "field {field}: {err}");
        }
    }

    #[test]
    fn rejects_mistyped_fields() {
        let identity = fresh_identity();

        let mut value = serde_json::to_value(&identity).unwrap();
        value["lineage"] = serde_json::json!("not a list");
        assert!(deserialize_identity(&value.to_string()).is_err());

        let mut value = serde_json::to_value(&identity).unwrap();
        value["capabilities"] = serde_json::json!({});
        assert!(deserialize_identity(&value.to_string()).is_err());

        let mut value = serde_json::to_value(&identity).unwrap();
        value["version"] = serde_json::json!("one");
        assert!(deserialize_identity(&value.to_string()).is_err());
    }
}
