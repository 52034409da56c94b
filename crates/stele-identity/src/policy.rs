//! # Reputation Evolution Policy
//!
//! Each evolution step carries a fraction of the identity's reputation
//! forward, determined by the kind and magnitude of the change. Callers
//! can override the computed rate per evolution; the policy supplies
//! the defaults.

use crate::identity::{AgentIdentity, ChangeType};
use crate::lifecycle::IdentityUpdates;

/// Default carry-forward rates per change class.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionPolicy {
    /// A change that touches none of the identity-defining fields.
    pub minor_update: f64,
    /// A new model version within the same provider/model family.
    pub model_version_change: f64,
    /// A move to a different model family.
    pub model_family_change: f64,
    /// Transfer to a different operator (also applied to forks).
    pub operator_transfer: f64,
    /// Capabilities were only added.
    pub capability_expansion: f64,
    /// Capabilities were only removed.
    pub capability_reduction: f64,
    /// A rebuild from scratch; nothing carries forward.
    pub full_rebuild: f64,
}

impl Default for EvolutionPolicy {
    fn default() -> Self {
        Self {
            minor_update: 0.95,
            model_version_change: 0.80,
            model_family_change: 0.20,
            operator_transfer: 0.50,
            capability_expansion: 0.90,
            capability_reduction: 1.00,
            full_rebuild: 0.00,
        }
    }
}

/// Compute the default reputation carry-forward for an evolution step.
///
/// - `created` always carries everything.
/// - `model_update` distinguishes a version bump within the same
///   `(provider, modelId)` pair from a family change; an update without
///   a model field is a minor update.
/// - `capability_change` distinguishes pure expansion, pure reduction,
///   and mixed changes (mixed takes the stricter of the two rates); an
///   update without capabilities is a minor update.
/// - `operator_transfer` and `fork` share a rate.
/// - `merge` takes the stricter of expansion and version-change rates.
pub fn carry_forward(
    change_type: ChangeType,
    current: &AgentIdentity,
    updates: &IdentityUpdates,
    policy: &EvolutionPolicy,
) -> f64 {
    match change_type {
        ChangeType::Created => 1.0,
        ChangeType::ModelUpdate => match &updates.model {
            Some(new_model) => {
                let same_family = new_model.provider == current.model.provider
                    && new_model.model_id == current.model.model_id;
                if same_family {
                    policy.model_version_change
                } else {
                    policy.model_family_change
                }
            }
            None => policy.minor_update,
        },
        ChangeType::CapabilityChange => {
            match updates.capabilities.as_ref().filter(|caps| !caps.is_empty()) {
                Some(new_caps) => {
                    let added = new_caps
                        .iter()
                        .any(|c| !current.capabilities.contains(c));
                    let removed = current
                        .capabilities
                        .iter()
                        .any(|c| !new_caps.contains(c));
                    match (added, removed) {
                        (true, false) => policy.capability_expansion,
                        (false, true) => policy.capability_reduction,
                        (true, true) => policy
                            .capability_expansion
                            .min(policy.capability_reduction),
                        (false, false) => policy.minor_update,
                    }
                }
                None => policy.minor_update,
            }
        }
        ChangeType::OperatorTransfer | ChangeType::Fork => policy.operator_transfer,
        ChangeType::Merge => policy
            .capability_expansion
            .min(policy.model_version_change),
    }
}
