//! # Delegation-Chain Narrowing
//!
//! A child covenant may only restrict what its parent grants. This
//! module parses both constraint texts and applies the CCL narrowing
//! validator, translating policy-level violations into covenant-level
//! ones.

use stele_ccl::{parse, validate_narrowing, PermitDenyStatement};

use crate::document::CovenantDocument;
use crate::error::CovenantError;

/// A reference to a CCL rule inside a covenant's constraints.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RuleRef {
    /// `"permit"` or `"deny"`.
    #[serde(rename = "type")]
    pub rule_type: String,
    /// The rule's action pattern.
    pub action: String,
    /// The rule's resource pattern.
    pub resource: String,
}

impl From<&PermitDenyStatement> for RuleRef {
    fn from(rule: &PermitDenyStatement) -> Self {
        Self {
            rule_type: rule.effect.to_string(),
            action: rule.action.clone(),
            resource: rule.resource.clone(),
        }
    }
}

/// A single chain-narrowing violation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChainViolation {
    /// The offending rule in the child covenant.
    #[serde(rename = "childRule")]
    pub child_rule: RuleRef,
    /// The parent rule it conflicts with.
    #[serde(rename = "parentRule")]
    pub parent_rule: RuleRef,
    /// Why the child broadens the parent.
    pub reason: String,
}

/// The outcome of chain-narrowing validation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChainNarrowingResult {
    /// True when the child only narrows the parent.
    pub valid: bool,
    /// All violations found; empty when valid.
    pub violations: Vec<ChainViolation>,
}

/// Validate that a child covenant only narrows its parent.
///
/// # Errors
///
/// Returns [`CovenantError::InvalidConstraints`] when either covenant's
/// constraint text fails to parse.
pub fn validate_chain_narrowing(
    child: &CovenantDocument,
    parent: &CovenantDocument,
) -> Result<ChainNarrowingResult, CovenantError> {
    let parent_ccl = parse(&parent.constraints)?;
    let child_ccl = parse(&child.constraints)?;
    let result = validate_narrowing(&parent_ccl, &child_ccl);

    Ok(ChainNarrowingResult {
        valid: result.valid,
        violations: result
            .violations
            .iter()
            .map(|v| ChainViolation {
                child_rule: RuleRef::from(&v.child_rule),
                parent_rule: RuleRef::from(&v.parent_rule),
                reason: v.reason.clone(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_covenant, CovenantOptions};
    use crate::document::Party;
    use stele_crypto::KeyPair;

    fn covenant_with_constraints(constraints: &str) -> CovenantDocument {
        let key = KeyPair::generate();
        build_covenant(CovenantOptions::new(
            Party::issuer("i", key.public_key_hex()),
            Party::beneficiary("b", KeyPair::generate().public_key_hex()),
            constraints,
            key.private_key_bytes().to_vec(),
        ))
        .unwrap()
    }

    #[test]
    fn narrowing_child_is_valid() {
        let parent = covenant_with_constraints("permit read on '/data/**'");
        let child = covenant_with_constraints("permit read on '/data/public'");
        let result = validate_chain_narrowing(&child, &parent).unwrap();
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn broadening_child_is_invalid_with_typed_violation() {
        let parent = covenant_with_constraints("permit read on '/data/public'");
        let child = covenant_with_constraints("permit read on '/data/**'");
        let result = validate_chain_narrowing(&child, &parent).unwrap();
        assert!(!result.valid);
        let v = &result.violations[0];
        assert_eq!(v.child_rule.rule_type, "permit");
        assert_eq!(v.child_rule.resource, "/data/**");
        assert_eq!(v.parent_rule.rule_type, "permit");
        assert!(v.reason.contains("not a subset"));
    }

    #[test]
    fn child_crossing_parent_deny_is_invalid() {
        let parent =
            covenant_with_constraints("permit ** on '/**'\ndeny write on '/etc/**'");
        let child = covenant_with_constraints("permit write on '/etc/hosts'");
        let result = validate_chain_narrowing(&child, &parent).unwrap();
        assert!(!result.valid);
        assert_eq!(result.violations[0].parent_rule.rule_type, "deny");
    }

    #[test]
    fn violation_serializes_with_wire_field_names() {
        let parent = covenant_with_constraints("permit read on '/a'");
        let child = covenant_with_constraints("permit read on '/b'");
        let result = validate_chain_narrowing(&child, &parent).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["violations"][0].get("childRule").is_some());
        assert!(json["violations"][0]["parentRule"].get("type").is_some());
    }
}
