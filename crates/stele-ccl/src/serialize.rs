//! # CCL Source Serialization
//!
//! Renders a parsed document back to human-readable CCL source. Round-
//! tripping a serialized document through the parser yields an equivalent
//! document: resources are single-quoted, limit periods use the largest
//! exact unit, and the default `high` severity is omitted.

use crate::ast::{
    BoolOp, CclDocument, ConditionNode, ConditionValue, LimitStatement, PermitDenyStatement,
    RequireStatement, Severity, Statement,
};

/// Serialize a document to multi-line CCL source text.
pub fn serialize(doc: &CclDocument) -> String {
    doc.statements()
        .iter()
        .map(serialize_statement)
        .collect::<Vec<_>>()
        .join("\n")
}

fn serialize_statement(stmt: &Statement) -> String {
    match stmt {
        Statement::PermitDeny(rule) => serialize_rule(rule),
        Statement::Require(req) => serialize_require(req),
        Statement::Limit(limit) => serialize_limit(limit),
    }
}

fn serialize_rule(rule: &PermitDenyStatement) -> String {
    let mut line = format!("{} {} on '{}'", rule.effect, rule.action, rule.resource);
    if let Some(cond) = &rule.condition {
        line.push_str(" when ");
        line.push_str(&serialize_condition(cond));
    }
    push_severity(&mut line, rule.severity);
    line
}

fn serialize_require(req: &RequireStatement) -> String {
    let mut line = format!("require {} on '{}'", req.action, req.resource);
    if let Some(cond) = &req.condition {
        line.push_str(" when ");
        line.push_str(&serialize_condition(cond));
    }
    push_severity(&mut line, req.severity);
    line
}

fn serialize_limit(limit: &LimitStatement) -> String {
    let (value, unit) = best_time_unit(limit.period_seconds);
    let mut line = format!("limit {} {} per {} {}", limit.action, limit.count, value, unit);
    push_severity(&mut line, limit.severity);
    line
}

fn push_severity(line: &mut String, severity: Severity) {
    if severity != Severity::High {
        line.push_str(" severity ");
        line.push_str(severity.as_str());
    }
}

/// Express a period in the largest unit that divides it exactly.
fn best_time_unit(seconds: u64) -> (u64, &'static str) {
    if seconds >= 86400 && seconds % 86400 == 0 {
        return (seconds / 86400, "days");
    }
    if seconds >= 3600 && seconds % 3600 == 0 {
        return (seconds / 3600, "hours");
    }
    if seconds >= 60 && seconds % 60 == 0 {
        return (seconds / 60, "minutes");
    }
    (seconds, "seconds")
}

fn serialize_condition(node: &ConditionNode) -> String {
    match node {
        ConditionNode::Leaf(cond) => format!(
            "{} {} {}",
            cond.field,
            cond.operator,
            serialize_value(&cond.value)
        ),
        ConditionNode::Compound(compound) => {
            if compound.op == BoolOp::Not {
                let inner = compound
                    .children
                    .first()
                    .map(serialize_condition)
                    .unwrap_or_default();
                return format!("not {inner}");
            }
            let parts: Vec<String> = compound
                .children
                .iter()
                .map(|child| {
                    // Parenthesize a nested compound of a different
                    // connective so precedence survives re-parsing.
                    match child {
                        ConditionNode::Compound(inner) if inner.op != compound.op => {
                            format!("({})", serialize_condition(child))
                        }
                        _ => serialize_condition(child),
                    }
                })
                .collect();
            parts.join(&format!(" {} ", compound.op.as_str()))
        }
    }
}

fn serialize_value(value: &ConditionValue) -> String {
    match value {
        ConditionValue::List(items) => {
            let quoted: Vec<String> = items.iter().map(|v| format!("'{v}'")).collect();
            format!("[{}]", quoted.join(", "))
        }
        ConditionValue::Str(s) => format!("'{s}'"),
        ConditionValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        ConditionValue::Int(i) => i.to_string(),
    }
}
