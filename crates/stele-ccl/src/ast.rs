//! # CCL Abstract Syntax Tree
//!
//! Tagged sum types for parsed policy statements, plus [`CclDocument`],
//! which carries the statement list together with its four categorized
//! views. The views are derived once at construction time and always
//! reflect the full statement list; documents are immutable after
//! construction.

/// Statement severity level. Defaults to `High` when a statement omits
/// the `severity` clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    /// Critical severity.
    Critical,
    /// High severity (the default).
    #[default]
    High,
    /// Medium severity.
    Medium,
    /// Low severity.
    Low,
}

impl Severity {
    /// Parse a lowercase severity keyword.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => return None,
        })
    }

    /// The keyword form of this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a rule grants or revokes access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The rule grants access when it wins.
    Permit,
    /// The rule revokes access when it wins.
    Deny,
}

impl Effect {
    /// The keyword form of this effect.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permit => "permit",
            Self::Deny => "deny",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comparison operator in a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`, numeric only.
    Lt,
    /// `>`, numeric only.
    Gt,
    /// `<=`, numeric only.
    Le,
    /// `>=`, numeric only.
    Ge,
    /// `contains`: substring or list membership.
    Contains,
    /// `not_contains`: negated `contains`; vacuously true when the
    /// field is absent.
    NotContains,
    /// `in`: stringified field is a member of the right-hand list.
    In,
    /// `not_in`: negated `in`; vacuously true when the field is absent.
    NotIn,
    /// `matches`: unanchored regular-expression search.
    Matches,
    /// `starts_with`
    StartsWith,
    /// `ends_with`
    EndsWith,
}

impl Operator {
    /// Parse an operator token value.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            "matches" => Self::Matches,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            _ => return None,
        })
    }

    /// The source form of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Matches => "matches",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The right-hand value of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// A string literal.
    Str(String),
    /// An unsigned decimal integer literal.
    Int(i64),
    /// `true` or `false`.
    Bool(bool),
    /// A list of strings (array elements are stringified at parse time).
    List(Vec<String>),
}

/// A simple condition comparing a dotted context field to a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Dotted path into the evaluation context (e.g. `user.role`).
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Right-hand value.
    pub value: ConditionValue,
}

/// Boolean connective of a compound condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// Conjunction over all children.
    And,
    /// Disjunction over all children.
    Or,
    /// Negation of a single child.
    Not,
}

impl BoolOp {
    /// The keyword form of this connective.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }
}

/// A compound condition. `And`/`Or` hold an N-ary flattened child list
/// (consecutive connectives at the same level merge into one node);
/// `Not` holds exactly one child.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundCondition {
    /// The boolean connective.
    pub op: BoolOp,
    /// Child conditions.
    pub children: Vec<ConditionNode>,
}

/// A condition tree node: either a leaf comparison or a compound.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// A simple field comparison.
    Leaf(Condition),
    /// A boolean combination of sub-conditions.
    Compound(CompoundCondition),
}

/// A `permit` or `deny` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct PermitDenyStatement {
    /// Grant or revoke.
    pub effect: Effect,
    /// Dot-separated action pattern.
    pub action: String,
    /// Slash-separated resource pattern.
    pub resource: String,
    /// Optional `when` condition.
    pub condition: Option<ConditionNode>,
    /// Severity, defaulting to high.
    pub severity: Severity,
    /// 1-indexed source line of the statement keyword.
    pub line: u32,
}

/// A `require` statement defining an obligation. Obligations are
/// reported by the evaluator but never decide permit/deny.
#[derive(Debug, Clone, PartialEq)]
pub struct RequireStatement {
    /// Dot-separated action pattern.
    pub action: String,
    /// Slash-separated resource pattern.
    pub resource: String,
    /// Optional `when` condition.
    pub condition: Option<ConditionNode>,
    /// Severity, defaulting to high.
    pub severity: Severity,
    /// 1-indexed source line of the statement keyword.
    pub line: u32,
}

/// A `limit` statement imposing a rate limit on an action pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitStatement {
    /// Dot-separated action pattern.
    pub action: String,
    /// Maximum invocations per window.
    pub count: u64,
    /// Window length in seconds (unit multiplier already applied).
    pub period_seconds: u64,
    /// Severity, defaulting to high.
    pub severity: Severity,
    /// 1-indexed source line of the statement keyword.
    pub line: u32,
}

/// Any CCL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A permit or deny rule.
    PermitDeny(PermitDenyStatement),
    /// An obligation.
    Require(RequireStatement),
    /// A rate limit.
    Limit(LimitStatement),
}

/// A parsed CCL document: the ordered statement list plus categorized
/// views derived by partitioning at construction time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CclDocument {
    statements: Vec<Statement>,
    permits: Vec<PermitDenyStatement>,
    denies: Vec<PermitDenyStatement>,
    obligations: Vec<RequireStatement>,
    limits: Vec<LimitStatement>,
}

impl CclDocument {
    /// Build a document from an ordered statement list, deriving the
    /// categorized views.
    pub fn from_statements(statements: Vec<Statement>) -> Self {
        let mut permits = Vec::new();
        let mut denies = Vec::new();
        let mut obligations = Vec::new();
        let mut limits = Vec::new();

        for stmt in &statements {
            match stmt {
                Statement::PermitDeny(rule) => match rule.effect {
                    Effect::Permit => permits.push(rule.clone()),
                    Effect::Deny => denies.push(rule.clone()),
                },
                Statement::Require(req) => obligations.push(req.clone()),
                Statement::Limit(limit) => limits.push(limit.clone()),
            }
        }

        Self {
            statements,
            permits,
            denies,
            obligations,
            limits,
        }
    }

    /// The full ordered statement list.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// All permit rules, in document order.
    pub fn permits(&self) -> &[PermitDenyStatement] {
        &self.permits
    }

    /// All deny rules, in document order.
    pub fn denies(&self) -> &[PermitDenyStatement] {
        &self.denies
    }

    /// All obligations, in document order.
    pub fn obligations(&self) -> &[RequireStatement] {
        &self.obligations
    }

    /// All rate limits, in document order.
    pub fn limits(&self) -> &[LimitStatement] {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(effect: Effect, action: &str) -> Statement {
        Statement::PermitDeny(PermitDenyStatement {
            effect,
            action: action.to_string(),
            resource: "*".to_string(),
            condition: None,
            severity: Severity::default(),
            line: 1,
        })
    }

    #[test]
    fn views_partition_statements() {
        let statements = vec![
            rule(Effect::Permit, "read"),
            rule(Effect::Deny, "write"),
            Statement::Require(RequireStatement {
                action: "audit".to_string(),
                resource: "*".to_string(),
                condition: None,
                severity: Severity::default(),
                line: 3,
            }),
            Statement::Limit(LimitStatement {
                action: "api".to_string(),
                count: 10,
                period_seconds: 60,
                severity: Severity::default(),
                line: 4,
            }),
        ];
        let doc = CclDocument::from_statements(statements);
        assert_eq!(doc.statements().len(), 4);
        assert_eq!(doc.permits().len(), 1);
        assert_eq!(doc.denies().len(), 1);
        assert_eq!(doc.obligations().len(), 1);
        assert_eq!(doc.limits().len(), 1);
        assert_eq!(doc.permits()[0].action, "read");
        assert_eq!(doc.denies()[0].action, "write");
    }

    #[test]
    fn severity_default_is_high() {
        assert_eq!(Severity::default(), Severity::High);
    }

    #[test]
    fn severity_parse_rejects_unknown() {
        assert!(Severity::parse("urgent").is_none());
        assert_eq!(Severity::parse("critical"), Some(Severity::Critical));
    }

    #[test]
    fn operator_parse_covers_all_source_forms() {
        for op in [
            "=",
            "!=",
            "<",
            ">",
            "<=",
            ">=",
            "contains",
            "not_contains",
            "in",
            "not_in",
            "matches",
            "starts_with",
            "ends_with",
        ] {
            let parsed = Operator::parse(op).unwrap();
            assert_eq!(parsed.as_str(), op);
        }
        assert!(Operator::parse("~=").is_none());
    }
}
