//! # Policy Evaluation and Rate-Limit Checking
//!
//! Evaluation resolves an `(action, resource, context)` triple against a
//! parsed document:
//!
//! 1. Collect every permit and deny whose action and resource patterns
//!    match and whose condition (if any) holds.
//! 2. Collect matching obligations into `all_matches`; they never decide
//!    the outcome.
//! 3. No matching rule means default deny.
//! 4. Otherwise sort by specificity descending, deny before permit at
//!    equal specificity, and the top rule decides.

use serde_json::Value;

use crate::ast::{
    BoolOp, CclDocument, Condition, ConditionNode, ConditionValue, Effect, LimitStatement,
    Operator, PermitDenyStatement, Severity, Statement,
};
use crate::matcher::{match_action, match_resource, specificity};

/// The outcome of evaluating a document against an action/resource pair.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    /// Whether the action is permitted.
    pub permitted: bool,
    /// The winning rule, when any permit or deny matched.
    pub matched_rule: Option<PermitDenyStatement>,
    /// Every statement that matched, including obligations.
    pub all_matches: Vec<Statement>,
    /// Human-readable explanation of the outcome.
    pub reason: String,
    /// Severity of the winning rule, when one exists.
    pub severity: Option<Severity>,
}

/// Evaluate a CCL document against an action/resource pair.
///
/// `context` is a nested JSON object consulted by `when` conditions;
/// pass an empty object when no context applies.
pub fn evaluate(
    doc: &CclDocument,
    action: &str,
    resource: &str,
    context: &Value,
) -> EvaluationResult {
    let mut all_matches: Vec<Statement> = Vec::new();
    let mut matched_rules: Vec<&PermitDenyStatement> = Vec::new();

    for stmt in doc.permits().iter().chain(doc.denies()) {
        if match_action(&stmt.action, action) && match_resource(&stmt.resource, resource) {
            let condition_holds = stmt
                .condition
                .as_ref()
                .map_or(true, |c| evaluate_condition(c, context));
            if condition_holds {
                matched_rules.push(stmt);
                all_matches.push(Statement::PermitDeny(stmt.clone()));
            }
        }
    }

    for req in doc.obligations() {
        if match_action(&req.action, action) && match_resource(&req.resource, resource) {
            let condition_holds = req
                .condition
                .as_ref()
                .map_or(true, |c| evaluate_condition(c, context));
            if condition_holds {
                all_matches.push(Statement::Require(req.clone()));
            }
        }
    }

    if matched_rules.is_empty() {
        return EvaluationResult {
            permitted: false,
            matched_rule: None,
            all_matches,
            reason: "No matching rules found; default deny".to_string(),
            severity: None,
        };
    }

    // Most specific first; at equal specificity a deny outranks a permit.
    // The sort is stable, so document order breaks any remaining ties.
    matched_rules.sort_by_key(|rule| {
        let spec = specificity(&rule.action, &rule.resource);
        let deny_priority = match rule.effect {
            Effect::Deny => 0u8,
            Effect::Permit => 1u8,
        };
        (std::cmp::Reverse(spec), deny_priority)
    });

    let winner = matched_rules[0];
    EvaluationResult {
        permitted: winner.effect == Effect::Permit,
        matched_rule: Some(winner.clone()),
        all_matches,
        reason: format!(
            "Matched {} rule for {} on {}",
            winner.effect, winner.action, winner.resource
        ),
        severity: Some(winner.severity),
    }
}

// ---------------------------------------------------------------------------
// Condition evaluation
// ---------------------------------------------------------------------------

/// Evaluate a condition tree against a nested JSON context.
pub fn evaluate_condition(node: &ConditionNode, context: &Value) -> bool {
    match node {
        ConditionNode::Leaf(cond) => evaluate_simple(cond, context),
        ConditionNode::Compound(compound) => match compound.op {
            BoolOp::And => compound
                .children
                .iter()
                .all(|c| evaluate_condition(c, context)),
            BoolOp::Or => compound
                .children
                .iter()
                .any(|c| evaluate_condition(c, context)),
            BoolOp::Not => compound
                .children
                .first()
                .map_or(false, |c| !evaluate_condition(c, context)),
        },
    }
}

/// Resolve a dotted field path against the context. Returns `None` when
/// any path component is missing or an intermediate value is not an
/// object.
fn resolve_field<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = context;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn evaluate_simple(cond: &Condition, context: &Value) -> bool {
    let field_value = resolve_field(context, &cond.field);

    let Some(field_value) = field_value else {
        // A missing field fails every positive operator; the negated
        // membership operators are vacuously satisfied on absence.
        return matches!(cond.operator, Operator::NotContains | Operator::NotIn);
    };

    match cond.operator {
        Operator::Eq => value_equals(field_value, &cond.value),
        Operator::Ne => !value_equals(field_value, &cond.value),
        Operator::Lt => numeric_cmp(field_value, &cond.value).map_or(false, |o| o.is_lt()),
        Operator::Gt => numeric_cmp(field_value, &cond.value).map_or(false, |o| o.is_gt()),
        Operator::Le => numeric_cmp(field_value, &cond.value).map_or(false, |o| o.is_le()),
        Operator::Ge => numeric_cmp(field_value, &cond.value).map_or(false, |o| o.is_ge()),
        Operator::Contains => contains(field_value, &cond.value),
        Operator::NotContains => match field_value {
            Value::String(_) | Value::Array(_) => !contains(field_value, &cond.value),
            _ => true,
        },
        Operator::In => match &cond.value {
            ConditionValue::List(list) => list.contains(&stringify(field_value)),
            _ => false,
        },
        Operator::NotIn => match &cond.value {
            ConditionValue::List(list) => !list.contains(&stringify(field_value)),
            _ => true,
        },
        Operator::Matches => match (&field_value, &cond.value) {
            (Value::String(s), ConditionValue::Str(pattern)) => {
                // Unanchored search; a pattern that fails to compile
                // evaluates to false rather than erroring.
                regex::Regex::new(pattern)
                    .map(|re| re.is_match(s))
                    .unwrap_or(false)
            }
            _ => false,
        },
        Operator::StartsWith => match (&field_value, &cond.value) {
            (Value::String(s), ConditionValue::Str(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        },
        Operator::EndsWith => match (&field_value, &cond.value) {
            (Value::String(s), ConditionValue::Str(suffix)) => s.ends_with(suffix.as_str()),
            _ => false,
        },
    }
}

/// Equality between a context value and a condition value. Numeric
/// equality is value-based (an integer context field equals an equal
/// integer literal regardless of JSON number representation).
fn value_equals(field: &Value, value: &ConditionValue) -> bool {
    match value {
        ConditionValue::Str(s) => field.as_str() == Some(s.as_str()),
        ConditionValue::Int(i) => field.as_f64() == Some(*i as f64),
        ConditionValue::Bool(b) => field.as_bool() == Some(*b),
        ConditionValue::List(list) => match field.as_array() {
            Some(arr) => {
                arr.len() == list.len()
                    && arr
                        .iter()
                        .zip(list.iter())
                        .all(|(a, b)| a.as_str() == Some(b.as_str()))
            }
            None => false,
        },
    }
}

fn numeric_cmp(field: &Value, value: &ConditionValue) -> Option<std::cmp::Ordering> {
    let ConditionValue::Int(rhs) = value else {
        return None;
    };
    let lhs = field.as_f64()?;
    lhs.partial_cmp(&(*rhs as f64))
}

/// `contains` over a string field (substring) or an array field
/// (membership).
fn contains(field: &Value, value: &ConditionValue) -> bool {
    match field {
        Value::String(s) => match value {
            ConditionValue::Str(needle) => s.contains(needle.as_str()),
            _ => false,
        },
        Value::Array(arr) => arr.iter().any(|item| value_equals(item, value)),
        _ => false,
    }
}

/// Stringify a context value for membership tests against string lists.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Rate limits
// ---------------------------------------------------------------------------

/// The outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitResult {
    /// Whether the current count has reached the limit within the window.
    pub exceeded: bool,
    /// The limit statement that applied, if any.
    pub limit: Option<LimitStatement>,
    /// Remaining invocations in the window; positive infinity when no
    /// limit matches the metric.
    pub remaining: f64,
}

/// Check whether a metric action has exceeded its rate limit.
///
/// The matching limit with the highest action specificity applies; at
/// equal specificity the first in document order wins. A window that
/// started more than one period ago has expired, so the count resets.
/// `now_ms` defaults to the current wall clock.
pub fn check_rate_limit(
    doc: &CclDocument,
    metric: &str,
    current_count: u64,
    window_start_ms: i64,
    now_ms: Option<i64>,
) -> RateLimitResult {
    let current_time = now_ms.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

    let mut matched: Option<&LimitStatement> = None;
    let mut best_spec: Option<u32> = None;

    for limit in doc.limits() {
        if match_action(&limit.action, metric) {
            let spec = specificity(&limit.action, "");
            if best_spec.map_or(true, |best| spec > best) {
                best_spec = Some(spec);
                matched = Some(limit);
            }
        }
    }

    let Some(limit) = matched else {
        return RateLimitResult {
            exceeded: false,
            limit: None,
            remaining: f64::INFINITY,
        };
    };

    let period_ms = i64::try_from(limit.period_seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);
    let elapsed = current_time.saturating_sub(window_start_ms);

    if elapsed > period_ms {
        // Window expired; the counter would reset.
        return RateLimitResult {
            exceeded: false,
            limit: Some(limit.clone()),
            remaining: limit.count as f64,
        };
    }

    RateLimitResult {
        exceeded: current_count >= limit.count,
        limit: Some(limit.clone()),
        remaining: limit.count.saturating_sub(current_count) as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn empty_ctx() -> Value {
        json!({})
    }

    #[test]
    fn default_deny_when_nothing_matches() {
        let doc = parse("permit read on '/allowed'").unwrap();
        let result = evaluate(&doc, "read", "/not-allowed", &empty_ctx());
        assert!(!result.permitted);
        assert!(result.matched_rule.is_none());
        assert!(result.reason.contains("default deny"));
    }

    #[test]
    fn matching_permit_allows() {
        let doc = parse("permit read on '/data/**'").unwrap();
        let result = evaluate(&doc, "read", "/data/users", &empty_ctx());
        assert!(result.permitted);
        assert_eq!(result.severity, Some(Severity::High));
        assert!(result.reason.contains("permit"));
    }

    #[test]
    fn deny_wins_at_equal_specificity() {
        let doc = parse("permit read on '/data/**'\ndeny read on '/data/**'").unwrap();
        let result = evaluate(&doc, "read", "/data/users", &empty_ctx());
        assert!(!result.permitted);
        assert_eq!(result.matched_rule.unwrap().effect, Effect::Deny);
        assert_eq!(result.all_matches.len(), 2);
    }

    #[test]
    fn more_specific_permit_overrides_broader_deny() {
        let doc = parse("deny read on '/data/**'\npermit read on '/data/public'").unwrap();
        let result = evaluate(&doc, "read", "/data/public", &empty_ctx());
        assert!(result.permitted);
    }

    #[test]
    fn more_specific_deny_overrides_broader_permit() {
        let doc = parse("permit ** on '/data/**'\ndeny write on '/data/secrets'").unwrap();
        let result = evaluate(&doc, "write", "/data/secrets", &empty_ctx());
        assert!(!result.permitted);
        let other = evaluate(&doc, "write", "/data/open", &empty_ctx());
        assert!(other.permitted);
    }

    #[test]
    fn failing_condition_excludes_rule() {
        let doc = parse("permit read on '/x' when user.role = 'admin'").unwrap();
        let denied = evaluate(&doc, "read", "/x", &json!({"user": {"role": "guest"}}));
        assert!(!denied.permitted);
        let allowed = evaluate(&doc, "read", "/x", &json!({"user": {"role": "admin"}}));
        assert!(allowed.permitted);
    }

    #[test]
    fn obligations_are_reported_but_do_not_decide() {
        let doc = parse("require audit.log on '/finance/**'").unwrap();
        let result = evaluate(&doc, "audit.log", "/finance/q3", &empty_ctx());
        assert!(!result.permitted);
        assert!(result.reason.contains("default deny"));
        assert_eq!(result.all_matches.len(), 1);
        assert!(matches!(result.all_matches[0], Statement::Require(_)));
    }

    #[test]
    fn obligations_accompany_permits_in_all_matches() {
        let doc =
            parse("permit read on '/finance/**'\nrequire audit.log on '/finance/**'").unwrap();
        let result = evaluate(&doc, "read", "/finance/q3", &empty_ctx());
        assert!(result.permitted);
        // Obligation matches only when its action pattern matches too.
        assert_eq!(result.all_matches.len(), 1);

        let wide = parse("permit ** on '/finance/**'\nrequire ** on '/finance/**'").unwrap();
        let both = evaluate(&wide, "read", "/finance/q3", &empty_ctx());
        assert_eq!(both.all_matches.len(), 2);
    }

    // -- Condition operators --

    #[test]
    fn equality_operators() {
        let ctx = json!({"n": 5, "s": "abc", "b": true});
        let doc = parse(
            "permit a on '/x' when n = 5\n\
             permit b on '/x' when s = 'abc'\n\
             permit c on '/x' when b = true\n\
             permit d on '/x' when n != 6",
        )
        .unwrap();
        for action in ["a", "b", "c", "d"] {
            assert!(
                evaluate(&doc, action, "/x", &ctx).permitted,
                "action {action}"
            );
        }
    }

    #[test]
    fn numeric_comparisons_require_numbers() {
        let doc = parse("permit a on '/x' when n < 10").unwrap();
        assert!(evaluate(&doc, "a", "/x", &json!({"n": 5})).permitted);
        assert!(!evaluate(&doc, "a", "/x", &json!({"n": 15})).permitted);
        // Non-numeric field never satisfies an ordering operator.
        assert!(!evaluate(&doc, "a", "/x", &json!({"n": "5"})).permitted);
    }

    #[test]
    fn ordering_operator_boundaries() {
        let ctx = json!({"n": 10});
        let le = parse("permit a on '/x' when n <= 10").unwrap();
        let ge = parse("permit a on '/x' when n >= 10").unwrap();
        let lt = parse("permit a on '/x' when n < 10").unwrap();
        let gt = parse("permit a on '/x' when n > 10").unwrap();
        assert!(evaluate(&le, "a", "/x", &ctx).permitted);
        assert!(evaluate(&ge, "a", "/x", &ctx).permitted);
        assert!(!evaluate(&lt, "a", "/x", &ctx).permitted);
        assert!(!evaluate(&gt, "a", "/x", &ctx).permitted);
    }

    #[test]
    fn contains_on_strings_and_lists() {
        let doc = parse("permit a on '/x' when tags contains 'prod'").unwrap();
        assert!(evaluate(&doc, "a", "/x", &json!({"tags": "preprod"})).permitted);
        assert!(evaluate(&doc, "a", "/x", &json!({"tags": ["dev", "prod"]})).permitted);
        assert!(!evaluate(&doc, "a", "/x", &json!({"tags": ["dev"]})).permitted);
        assert!(!evaluate(&doc, "a", "/x", &json!({"tags": 7})).permitted);
    }

    #[test]
    fn not_contains_is_vacuously_true_on_absence() {
        let doc = parse("permit a on '/x' when tags not_contains 'banned'").unwrap();
        assert!(evaluate(&doc, "a", "/x", &json!({})).permitted);
        assert!(evaluate(&doc, "a", "/x", &json!({"tags": ["ok"]})).permitted);
        assert!(!evaluate(&doc, "a", "/x", &json!({"tags": ["banned"]})).permitted);
    }

    #[test]
    fn in_and_not_in_stringify_the_field() {
        let doc = parse("permit a on '/x' when region in ['eu', 'us']").unwrap();
        assert!(evaluate(&doc, "a", "/x", &json!({"region": "eu"})).permitted);
        assert!(!evaluate(&doc, "a", "/x", &json!({"region": "apac"})).permitted);

        let nums = parse("permit a on '/x' when code in ['5', '6']").unwrap();
        assert!(evaluate(&nums, "a", "/x", &json!({"code": 5})).permitted);

        let not_in = parse("permit a on '/x' when region not_in ['cn']").unwrap();
        assert!(evaluate(&not_in, "a", "/x", &json!({"region": "eu"})).permitted);
        assert!(evaluate(&not_in, "a", "/x", &json!({})).permitted);
        assert!(!evaluate(&not_in, "a", "/x", &json!({"region": "cn"})).permitted);
    }

    #[test]
    fn matches_operator_is_unanchored_search() {
        let doc = parse("permit a on '/x' when path matches 'v[0-9]+'").unwrap();
        assert!(evaluate(&doc, "a", "/x", &json!({"path": "/api/v2/users"})).permitted);
        assert!(!evaluate(&doc, "a", "/x", &json!({"path": "/api/beta"})).permitted);
    }

    #[test]
    fn invalid_regex_evaluates_false() {
        let doc = parse("permit a on '/x' when path matches '(unclosed'").unwrap();
        assert!(!evaluate(&doc, "a", "/x", &json!({"path": "(unclosed"})).permitted);
    }

    #[test]
    fn starts_with_and_ends_with() {
        let doc = parse(
            "permit a on '/x' when host starts_with 'api.'\n\
             permit b on '/x' when host ends_with '.internal'",
        )
        .unwrap();
        let ctx = json!({"host": "api.stele.internal"});
        assert!(evaluate(&doc, "a", "/x", &ctx).permitted);
        assert!(evaluate(&doc, "b", "/x", &ctx).permitted);
        assert!(!evaluate(&doc, "a", "/x", &json!({"host": "web.stele.io"})).permitted);
    }

    #[test]
    fn missing_field_fails_positive_operators() {
        for cond in [
            "n = 1",
            "n != 1",
            "n < 1",
            "s contains 'x'",
            "s matches 'x'",
            "s starts_with 'x'",
        ] {
            let doc = parse(&format!("permit a on '/x' when {cond}")).unwrap();
            assert!(
                !evaluate(&doc, "a", "/x", &json!({})).permitted,
                "cond {cond}"
            );
        }
    }

    #[test]
    fn dotted_field_resolution_walks_nested_objects() {
        let doc = parse("permit a on '/x' when req.user.org = 'acme'").unwrap();
        let ctx = json!({"req": {"user": {"org": "acme"}}});
        assert!(evaluate(&doc, "a", "/x", &ctx).permitted);
        // Intermediate non-object short-circuits to absent.
        let bad = json!({"req": "flat"});
        assert!(!evaluate(&doc, "a", "/x", &bad).permitted);
    }

    #[test]
    fn compound_conditions() {
        let doc = parse(
            "permit a on '/x' when role = 'admin' and env = 'prod'\n\
             permit b on '/x' when role = 'admin' or role = 'ops'\n\
             permit c on '/x' when not role = 'guest'",
        )
        .unwrap();
        let admin_prod = json!({"role": "admin", "env": "prod"});
        let ops = json!({"role": "ops"});
        let guest = json!({"role": "guest"});

        assert!(evaluate(&doc, "a", "/x", &admin_prod).permitted);
        assert!(!evaluate(&doc, "a", "/x", &ops).permitted);
        assert!(evaluate(&doc, "b", "/x", &ops).permitted);
        assert!(!evaluate(&doc, "b", "/x", &guest).permitted);
        assert!(evaluate(&doc, "c", "/x", &ops).permitted);
        assert!(!evaluate(&doc, "c", "/x", &guest).permitted);
    }

    // -- Rate limits --

    #[test]
    fn rate_limit_within_window() {
        let doc = parse("limit api.call 100 per 1 hours").unwrap();
        let now = 10_000_000i64;

        let at_cap = check_rate_limit(&doc, "api.call", 100, now - 1000, Some(now));
        assert!(at_cap.exceeded);
        assert_eq!(at_cap.remaining, 0.0);

        let below = check_rate_limit(&doc, "api.call", 40, now - 1000, Some(now));
        assert!(!below.exceeded);
        assert_eq!(below.remaining, 60.0);
    }

    #[test]
    fn rate_limit_expired_window_resets() {
        let doc = parse("limit api.call 100 per 1 hours").unwrap();
        let now = 10_000_000i64;
        let result = check_rate_limit(&doc, "api.call", 100, now - 4_000_000, Some(now));
        assert!(!result.exceeded);
        assert_eq!(result.remaining, 100.0);
    }

    #[test]
    fn rate_limit_no_matching_limit_is_unbounded() {
        let doc = parse("limit api.call 100 per 1 hours").unwrap();
        let result = check_rate_limit(&doc, "db.query", 1_000_000, 0, Some(1));
        assert!(!result.exceeded);
        assert!(result.remaining.is_infinite());
        assert!(result.limit.is_none());
    }

    #[test]
    fn most_specific_limit_wins() {
        let doc = parse("limit ** 1000 per 1 hours\nlimit api.call 10 per 1 hours").unwrap();
        let now = 1_000_000i64;
        let result = check_rate_limit(&doc, "api.call", 10, now - 1, Some(now));
        assert!(result.exceeded);
        assert_eq!(result.limit.unwrap().count, 10);
    }

    #[test]
    fn first_limit_wins_specificity_ties() {
        let doc = parse("limit api.call 10 per 1 hours\nlimit api.call 99 per 1 hours").unwrap();
        let result = check_rate_limit(&doc, "api.call", 0, 0, Some(1));
        assert_eq!(result.limit.unwrap().count, 10);
    }

    #[test]
    fn remaining_is_monotonic_in_current_count() {
        let doc = parse("limit api.call 50 per 1 minutes").unwrap();
        let now = 60_000i64;
        let mut last = f64::INFINITY;
        for count in 0..60 {
            let r = check_rate_limit(&doc, "api.call", count, now - 1, Some(now));
            assert!(r.remaining <= last);
            last = r.remaining;
        }
    }
}
