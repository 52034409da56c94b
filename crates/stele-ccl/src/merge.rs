//! # Deny-Wins Document Merge
//!
//! Merging a parent and child document produces a new document by
//! concatenation: denies from both sides lead, child permits precede
//! parent permits, obligations from both sides follow, and limits keep
//! the lower count per action. Deny dominance comes from evaluation
//! semantics (denies outrank permits at equal specificity), so simple
//! concatenation preserves it.

use crate::ast::{CclDocument, LimitStatement, Statement};

/// Merge a parent and child CCL document with deny-wins semantics.
///
/// Statement order in the result:
/// 1. parent denies, then child denies;
/// 2. child permits, then parent permits;
/// 3. parent obligations, then child obligations;
/// 4. limits, keeping the lower `count` for each action. When two limits
///    share an action but differ in period, the lower count still wins;
///    periods are not reconciled.
pub fn merge(parent: &CclDocument, child: &CclDocument) -> CclDocument {
    let mut statements: Vec<Statement> = Vec::new();

    for deny in parent.denies().iter().chain(child.denies()) {
        statements.push(Statement::PermitDeny(deny.clone()));
    }
    for permit in child.permits().iter().chain(parent.permits()) {
        statements.push(Statement::PermitDeny(permit.clone()));
    }
    for obligation in parent.obligations().iter().chain(child.obligations()) {
        statements.push(Statement::Require(obligation.clone()));
    }

    // Per-action most-restrictive limit, preserving first-seen order.
    let mut limits: Vec<LimitStatement> = Vec::new();
    for limit in parent.limits().iter().chain(child.limits()) {
        match limits.iter_mut().find(|l| l.action == limit.action) {
            Some(existing) => {
                if limit.count < existing.count {
                    *existing = limit.clone();
                }
            }
            None => limits.push(limit.clone()),
        }
    }
    statements.extend(limits.into_iter().map(Statement::Limit));

    CclDocument::from_statements(statements)
}
