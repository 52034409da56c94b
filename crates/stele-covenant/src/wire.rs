//! # Wire Serialization
//!
//! Covenants travel as plain JSON objects. Serialization is compact
//! (non-canonical — field order follows the struct; only hashing and
//! signing use the canonical form). Deserialization validates structure
//! eagerly so that downstream code never sees a shape-invalid document:
//! required fields, fixed party roles, the protocol version, chain field
//! types, and the size cap.

use serde_json::Value;

use crate::document::{CovenantDocument, MAX_DOCUMENT_SIZE, PROTOCOL_VERSION};
use crate::error::CovenantError;

/// Serialize a covenant document to a compact JSON string.
pub fn serialize_covenant(doc: &CovenantDocument) -> Result<String, CovenantError> {
    Ok(serde_json::to_string(doc)?)
}

/// Deserialize and structurally validate a covenant document.
///
/// # Errors
///
/// Returns [`CovenantError::Deserialize`] when the JSON is malformed, a
/// required field is missing or mistyped, the party roles are wrong,
/// the protocol version is unsupported, or the input exceeds the size
/// cap.
pub fn deserialize_covenant(json_str: &str) -> Result<CovenantDocument, CovenantError> {
    let parsed: Value = serde_json::from_str(json_str)
        .map_err(|e| CovenantError::Deserialize(format!("invalid JSON: {e}")))?;

    let obj = parsed
        .as_object()
        .ok_or_else(|| CovenantError::Deserialize("covenant must be a JSON object".to_string()))?;

    for field in ["id", "version", "constraints", "nonce", "createdAt", "signature"] {
        if !obj.get(field).map_or(false, Value::is_string) {
            return Err(CovenantError::Deserialize(format!(
                "missing or invalid required field: {field}"
            )));
        }
    }

    validate_party_value(obj.get("issuer"), "issuer")?;
    validate_party_value(obj.get("beneficiary"), "beneficiary")?;

    let version = obj.get("version").and_then(Value::as_str).unwrap_or("");
    if version != PROTOCOL_VERSION {
        return Err(CovenantError::Deserialize(format!(
            "unsupported protocol version: {version} (expected {PROTOCOL_VERSION})"
        )));
    }

    if let Some(chain) = obj.get("chain") {
        let chain_obj = chain.as_object().ok_or_else(|| {
            CovenantError::Deserialize("invalid chain: must be an object".to_string())
        })?;
        if !chain_obj.get("parentId").map_or(false, Value::is_string) {
            return Err(CovenantError::Deserialize(
                "invalid chain.parentId: must be a string".to_string(),
            ));
        }
        if !chain_obj.get("relation").map_or(false, Value::is_string) {
            return Err(CovenantError::Deserialize(
                "invalid chain.relation: must be a string".to_string(),
            ));
        }
        if !chain_obj.get("depth").map_or(false, Value::is_number) {
            return Err(CovenantError::Deserialize(
                "invalid chain.depth: must be a number".to_string(),
            ));
        }
    }

    if json_str.len() > MAX_DOCUMENT_SIZE {
        return Err(CovenantError::Deserialize(format!(
            "document size {} bytes exceeds maximum of {MAX_DOCUMENT_SIZE} bytes",
            json_str.len()
        )));
    }

    serde_json::from_value(parsed).map_err(|e| CovenantError::Deserialize(e.to_string()))
}

fn validate_party_value(value: Option<&Value>, field: &str) -> Result<(), CovenantError> {
    let party = value.and_then(Value::as_object).ok_or_else(|| {
        CovenantError::Deserialize(format!("missing or invalid required field: {field}"))
    })?;
    let shape_ok = party.get("id").map_or(false, Value::is_string)
        && party.get("publicKey").map_or(false, Value::is_string)
        && party.get("role").and_then(Value::as_str) == Some(field);
    if !shape_ok {
        return Err(CovenantError::Deserialize(format!(
            "invalid {field}: must have id, publicKey, and role=\"{field}\""
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_covenant, CovenantOptions};
    use crate::document::Party;
    use crate::verify::verify_covenant;
    use stele_crypto::KeyPair;

    fn build_test_covenant() -> CovenantDocument {
        let key = KeyPair::generate();
        build_covenant(CovenantOptions::new(
            Party::issuer("issuer-1", key.public_key_hex()),
            Party::beneficiary("agent-1", KeyPair::generate().public_key_hex()),
            "permit read on '/data/**'",
            key.private_key_bytes().to_vec(),
        ))
        .unwrap()
    }

    #[test]
    fn roundtrip_preserves_document_and_verifiability() {
        let doc = build_test_covenant();
        let json = serialize_covenant(&doc).unwrap();
        let back = deserialize_covenant(&json).unwrap();
        assert_eq!(doc, back);
        assert!(verify_covenant(&back).valid);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = deserialize_covenant("{not json").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn rejects_non_object() {
        assert!(deserialize_covenant("[1,2,3]").is_err());
        assert!(deserialize_covenant("\"covenant\"").is_err());
    }

    #[test]
    fn rejects_missing_required_fields() {
        let doc = build_test_covenant();
        for field in ["id", "version", "constraints", "nonce", "createdAt", "signature"] {
            let mut value = serde_json::to_value(&doc).unwrap();
            value.as_object_mut().unwrap().remove(field);
            let err = deserialize_covenant(&value.to_string()).unwrap_err();
            assert!(
                err.to_string().contains(field),
                "field {field}: {err}"
            );
        }
    }

    #[test]
    fn rejects_mistyped_required_field() {
        let doc = build_test_covenant();
        let mut value = serde_json::to_value(&doc).unwrap();
        value["nonce"] = serde_json::json!(42);
        assert!(deserialize_covenant(&value.to_string()).is_err());
    }

    #[test]
    fn rejects_wrong_party_role() {
        let doc = build_test_covenant();
        let mut value = serde_json::to_value(&doc).unwrap();
        value["issuer"]["role"] = serde_json::json!("beneficiary");
        let err = deserialize_covenant(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn rejects_unsupported_version() {
        let doc = build_test_covenant();
        let mut value = serde_json::to_value(&doc).unwrap();
        value["version"] = serde_json::json!("2.0");
        let err = deserialize_covenant(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("unsupported protocol version"));
    }

    #[test]
    fn rejects_mistyped_chain_fields() {
        let doc = build_test_covenant();
        let mut value = serde_json::to_value(&doc).unwrap();
        value["chain"] = serde_json::json!({"parentId": 7, "relation": "delegation", "depth": 1});
        assert!(deserialize_covenant(&value.to_string()).is_err());

        let mut value = serde_json::to_value(&doc).unwrap();
        value["chain"] =
            serde_json::json!({"parentId": "a", "relation": "delegation", "depth": "deep"});
        assert!(deserialize_covenant(&value.to_string()).is_err());
    }

    #[test]
    fn rejects_oversized_input() {
        let doc = build_test_covenant();
        let mut value = serde_json::to_value(&doc).unwrap();
        value["metadata"] = serde_json::json!({"filler": "x".repeat(MAX_DOCUMENT_SIZE)});
        let err = deserialize_covenant(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn rejects_unknown_top_level_fields() {
        let doc = build_test_covenant();
        let mut value = serde_json::to_value(&doc).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("extra".to_string(), serde_json::json!(true));
        assert!(deserialize_covenant(&value.to_string()).is_err());
    }
}
