//! # Narrowing Validation
//!
//! Decides whether a child document only restricts its parent. A valid
//! delegation step may restate or narrow what the parent grants; it may
//! never broaden it. Concretely, a child document is valid against a
//! parent iff:
//!
//! - no child permit overlaps any parent deny, and
//! - every child permit is a subset of some parent permit, on both the
//!   action and the resource pattern.
//!
//! The subset relation is stricter than classic glob subsetting: a child
//! `*` segment is only accepted under a parent `*` or `**`, and a child
//! `**` only under a parent `**`.

use crate::ast::{CclDocument, PermitDenyStatement};
use crate::matcher::{match_action, match_resource};

/// A single narrowing violation: the child rule, the parent rule it
/// conflicts with (an overlapping deny, or the first parent permit when
/// no subset match exists), and a reason.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrowingViolation {
    /// The offending child rule.
    pub child_rule: PermitDenyStatement,
    /// The reference parent rule.
    pub parent_rule: PermitDenyStatement,
    /// Why the child rule broadens the parent.
    pub reason: String,
}

/// The outcome of narrowing validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrowingResult {
    /// True when the child only narrows the parent.
    pub valid: bool,
    /// All violations found; empty when valid.
    pub violations: Vec<NarrowingViolation>,
}

/// Validate that a child CCL document only narrows the parent.
pub fn validate_narrowing(parent: &CclDocument, child: &CclDocument) -> NarrowingResult {
    let mut violations = Vec::new();

    for child_permit in child.permits() {
        for parent_deny in parent.denies() {
            if patterns_overlap(&child_permit.action, &parent_deny.action)
                && patterns_overlap(&child_permit.resource, &parent_deny.resource)
            {
                violations.push(NarrowingViolation {
                    child_rule: child_permit.clone(),
                    parent_rule: parent_deny.clone(),
                    reason: format!(
                        "Child permits '{}' on '{}' which parent denies",
                        child_permit.action, child_permit.resource
                    ),
                });
            }
        }

        let has_matching_parent_permit = parent.permits().iter().any(|parent_permit| {
            is_subset_pattern(&child_permit.action, &parent_permit.action, '.')
                && is_subset_pattern(&child_permit.resource, &parent_permit.resource, '/')
        });

        if !parent.permits().is_empty() && !has_matching_parent_permit {
            violations.push(NarrowingViolation {
                child_rule: child_permit.clone(),
                parent_rule: parent.permits()[0].clone(),
                reason: format!(
                    "Child permit '{}' on '{}' is not a subset of any parent permit",
                    child_permit.action, child_permit.resource
                ),
            });
        }
    }

    NarrowingResult {
        valid: violations.is_empty(),
        violations,
    }
}

/// Can the two patterns match a common concrete value?
///
/// Wildcard patterns overlap everything at their level; otherwise each
/// pattern's wildcards are substituted with a placeholder literal and
/// matched against the other pattern, in both directions.
pub fn patterns_overlap(pattern1: &str, pattern2: &str) -> bool {
    if pattern1 == "**" || pattern2 == "**" {
        return true;
    }
    if pattern1 == "*" || pattern2 == "*" {
        return true;
    }
    if pattern1 == pattern2 {
        return true;
    }

    let concrete1 = pattern1.replace("**", "x").replace('*', "x");
    let concrete2 = pattern2.replace("**", "x").replace('*', "x");

    let match1 = if pattern1.contains('/') {
        match_resource
    } else {
        match_action
    };
    let match2 = if pattern2.contains('/') {
        match_resource
    } else {
        match_action
    };

    match1(pattern1, &concrete2) || match2(pattern2, &concrete1)
}

/// Is `child_pattern` at most as broad as `parent_pattern`?
pub fn is_subset_pattern(child_pattern: &str, parent_pattern: &str, separator: char) -> bool {
    if parent_pattern == "**" {
        return true;
    }
    if child_pattern == "**" {
        // ** is the broadest pattern; only ** covers it, handled above.
        return false;
    }

    let child_parts: Vec<&str> = child_pattern
        .split(separator)
        .filter(|p| !p.is_empty())
        .collect();
    let parent_parts: Vec<&str> = parent_pattern
        .split(separator)
        .filter(|p| !p.is_empty())
        .collect();
    is_subset_segments(&child_parts, 0, &parent_parts, 0)
}

/// Front-to-back subset decision over segments.
///
/// Rule table, evaluated with remainders:
///
/// | parent | child | action |
/// |--------|-------|--------|
/// | `**`   | any   | parent consumes 0 or 1+ child segments; recurse both ways |
/// | any    | `**`  | invalid unless parent is also `**` |
/// | `*`    | any   | both advance |
/// | lit p  | `*`   | invalid |
/// | lit p  | lit c | advance iff `p == c` |
///
/// An exhausted child is valid iff every remaining parent segment is
/// `**`. An exhausted parent with remaining child segments is invalid.
fn is_subset_segments(child: &[&str], ci: usize, parent: &[&str], pi: usize) -> bool {
    if ci == child.len() && pi == parent.len() {
        return true;
    }
    if pi == parent.len() {
        return false;
    }
    if ci == child.len() {
        return parent[pi..].iter().all(|seg| *seg == "**");
    }

    let p_seg = parent[pi];
    let c_seg = child[ci];

    if p_seg == "**" {
        if is_subset_segments(child, ci, parent, pi + 1) {
            return true;
        }
        return is_subset_segments(child, ci + 1, parent, pi);
    }

    if c_seg == "**" {
        // Only reachable when the parent segment is narrower than **.
        return false;
    }

    if p_seg == "*" {
        return is_subset_segments(child, ci + 1, parent, pi + 1);
    }

    if c_seg == "*" {
        // A child * under a literal parent segment would broaden it.
        return false;
    }

    if c_seg != p_seg {
        return false;
    }
    is_subset_segments(child, ci + 1, parent, pi + 1)
}
