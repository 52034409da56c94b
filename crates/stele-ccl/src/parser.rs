//! # CCL Parser
//!
//! Recursive descent over the token stream. Statements are dispatched on
//! their leading keyword; `Newline` and `Comment` tokens separate
//! statements and are skipped between them. Empty source is an error —
//! a covenant with no constraints is meaningless.

use crate::ast::{
    BoolOp, CclDocument, CompoundCondition, Condition, ConditionNode, ConditionValue, Effect,
    LimitStatement, Operator, PermitDenyStatement, RequireStatement, Severity, Statement,
};
use crate::error::CclSyntaxError;
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};

/// Parse CCL source text into a [`CclDocument`].
///
/// # Errors
///
/// Returns [`CclSyntaxError`] with a 1-indexed source position when the
/// input is empty or contains a syntax error.
pub fn parse(source: &str) -> Result<CclDocument, CclSyntaxError> {
    if source.trim().is_empty() {
        return Err(CclSyntaxError::new(
            "CCL parse error: input is empty. Provide at least one statement, \
             e.g.: permit read on '/data/**'",
            1,
            1,
        ));
    }
    let tokens = tokenize(source);
    Parser::new(tokens).parse()
}

/// Convert a time-unit keyword to its multiplier in seconds. Unknown
/// units fall back to 1; the lexer only produces the known spellings.
fn time_unit_multiplier(unit: &str) -> u64 {
    match unit.to_lowercase().as_str() {
        "minute" | "minutes" => 60,
        "hour" | "hours" => 3600,
        "day" | "days" => 86400,
        _ => 1,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<CclDocument, CclSyntaxError> {
        let mut statements = Vec::new();
        self.skip_separators();

        while !self.is_at_end() {
            let tok = self.current();
            if matches!(tok.kind, TokenKind::Newline | TokenKind::Comment) {
                self.advance();
                self.skip_separators();
                continue;
            }
            statements.push(self.parse_statement()?);
            self.skip_separators();
        }

        Ok(CclDocument::from_statements(statements))
    }

    fn parse_statement(&mut self) -> Result<Statement, CclSyntaxError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Permit | TokenKind::Deny => {
                Ok(Statement::PermitDeny(self.parse_permit_deny()?))
            }
            TokenKind::Require => Ok(Statement::Require(self.parse_require()?)),
            TokenKind::Limit => Ok(Statement::Limit(self.parse_limit()?)),
            _ => Err(CclSyntaxError::new(
                format!(
                    "Expected statement keyword (permit, deny, require, or limit), \
                     but got '{}'",
                    tok.value
                ),
                tok.line,
                tok.column,
            )),
        }
    }

    fn parse_permit_deny(&mut self) -> Result<PermitDenyStatement, CclSyntaxError> {
        let keyword = self.current().clone();
        let effect = if keyword.kind == TokenKind::Permit {
            Effect::Permit
        } else {
            Effect::Deny
        };
        self.advance();

        let action = self.parse_action()?;
        self.expect(TokenKind::On, "Expected 'on' after action")?;
        let resource = self.parse_resource()?;

        let condition = if self.check(TokenKind::When) {
            self.advance();
            Some(self.parse_condition()?)
        } else {
            None
        };

        let severity = self.parse_optional_severity()?;

        Ok(PermitDenyStatement {
            effect,
            action,
            resource,
            condition,
            severity,
            line: keyword.line,
        })
    }

    fn parse_require(&mut self) -> Result<RequireStatement, CclSyntaxError> {
        let keyword = self.current().clone();
        self.advance();

        let action = self.parse_action()?;
        self.expect(TokenKind::On, "Expected 'on' after action")?;
        let resource = self.parse_resource()?;

        let condition = if self.check(TokenKind::When) {
            self.advance();
            Some(self.parse_condition()?)
        } else {
            None
        };

        let severity = self.parse_optional_severity()?;

        Ok(RequireStatement {
            action,
            resource,
            condition,
            severity,
            line: keyword.line,
        })
    }

    fn parse_limit(&mut self) -> Result<LimitStatement, CclSyntaxError> {
        let keyword = self.current().clone();
        self.advance();

        let action = self.parse_action()?;

        let count_tok = self.current().clone();
        if count_tok.kind != TokenKind::Number {
            return Err(CclSyntaxError::new(
                format!(
                    "Expected count number after action in limit statement, got '{}'",
                    count_tok.value
                ),
                count_tok.line,
                count_tok.column,
            ));
        }
        let count = self.parse_number(&count_tok)?;
        self.advance();

        self.expect(TokenKind::Per, "Expected 'per' in limit statement")?;

        let period_tok = self.current().clone();
        if period_tok.kind != TokenKind::Number {
            return Err(CclSyntaxError::new(
                format!(
                    "Expected period number after 'per' in limit statement, got '{}'",
                    period_tok.value
                ),
                period_tok.line,
                period_tok.column,
            ));
        }
        let raw_period = self.parse_number(&period_tok)?;
        self.advance();

        let unit_tok = self.expect(
            TokenKind::Seconds,
            "Expected time unit (seconds, minutes, hours, days) in limit statement",
        )?;
        // Saturate rather than overflow: constraint text may be hostile.
        let period_seconds = raw_period.saturating_mul(time_unit_multiplier(&unit_tok.value));

        let severity = self.parse_optional_severity()?;

        Ok(LimitStatement {
            action,
            count,
            period_seconds,
            severity,
            line: keyword.line,
        })
    }

    fn parse_action(&mut self) -> Result<String, CclSyntaxError> {
        let mut parts: Vec<String> = Vec::new();
        let tok = self.current().clone();

        match tok.kind {
            TokenKind::DoubleWildcard => {
                self.advance();
                return Ok("**".to_string());
            }
            TokenKind::Wildcard => {
                parts.push("*".to_string());
                self.advance();
            }
            TokenKind::Identifier => {
                parts.push(tok.value);
                self.advance();
            }
            _ => {
                return Err(CclSyntaxError::new(
                    format!("Expected action identifier, got '{}'", tok.value),
                    tok.line,
                    tok.column,
                ));
            }
        }

        while self.check(TokenKind::Dot) {
            self.advance();
            let next = self.current().clone();
            match next.kind {
                TokenKind::Identifier => {
                    parts.push(next.value);
                    self.advance();
                }
                TokenKind::Wildcard => {
                    parts.push("*".to_string());
                    self.advance();
                }
                TokenKind::DoubleWildcard => {
                    parts.push("**".to_string());
                    self.advance();
                }
                _ => {
                    return Err(CclSyntaxError::new(
                        format!(
                            "Expected identifier or wildcard after dot in action, got '{}'",
                            next.value
                        ),
                        next.line,
                        next.column,
                    ));
                }
            }
        }

        Ok(parts.join("."))
    }

    fn parse_resource(&mut self) -> Result<String, CclSyntaxError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Str | TokenKind::Identifier => {
                self.advance();
                Ok(tok.value)
            }
            TokenKind::Wildcard => {
                self.advance();
                Ok("*".to_string())
            }
            TokenKind::DoubleWildcard => {
                self.advance();
                Ok("**".to_string())
            }
            _ => Err(CclSyntaxError::new(
                format!("Expected resource (string or pattern), got '{}'", tok.value),
                tok.line,
                tok.column,
            )),
        }
    }

    // -- Conditions --

    fn parse_condition(&mut self) -> Result<ConditionNode, CclSyntaxError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<ConditionNode, CclSyntaxError> {
        let mut left = self.parse_and_expr()?;

        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            // Consecutive `or`s at the same level flatten into one
            // N-ary compound rather than a leaning binary tree.
            left = match left {
                ConditionNode::Compound(mut c) if c.op == BoolOp::Or => {
                    c.children.push(right);
                    ConditionNode::Compound(c)
                }
                other => ConditionNode::Compound(CompoundCondition {
                    op: BoolOp::Or,
                    children: vec![other, right],
                }),
            };
        }

        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<ConditionNode, CclSyntaxError> {
        let mut left = self.parse_not_expr()?;

        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_not_expr()?;
            left = match left {
                ConditionNode::Compound(mut c) if c.op == BoolOp::And => {
                    c.children.push(right);
                    ConditionNode::Compound(c)
                }
                other => ConditionNode::Compound(CompoundCondition {
                    op: BoolOp::And,
                    children: vec![other, right],
                }),
            };
        }

        Ok(left)
    }

    fn parse_not_expr(&mut self) -> Result<ConditionNode, CclSyntaxError> {
        if self.check(TokenKind::Not) {
            self.advance();
            let inner = self.parse_not_expr()?;
            return Ok(ConditionNode::Compound(CompoundCondition {
                op: BoolOp::Not,
                children: vec![inner],
            }));
        }
        self.parse_primary_cond()
    }

    fn parse_primary_cond(&mut self) -> Result<ConditionNode, CclSyntaxError> {
        if self.check(TokenKind::LParen) {
            self.advance();
            let expr = self.parse_condition()?;
            self.expect(TokenKind::RParen, "Expected ')' after condition")?;
            return Ok(expr);
        }
        Ok(ConditionNode::Leaf(self.parse_comparison()?))
    }

    fn parse_comparison(&mut self) -> Result<Condition, CclSyntaxError> {
        let field = self.parse_field()?;

        let op_tok = self.current().clone();
        if op_tok.kind != TokenKind::Operator {
            return Err(CclSyntaxError::new(
                format!(
                    "Expected operator after field '{field}', got '{}'",
                    op_tok.value
                ),
                op_tok.line,
                op_tok.column,
            ));
        }
        let operator = Operator::parse(&op_tok.value).ok_or_else(|| {
            CclSyntaxError::new(
                format!("Unknown operator '{}'", op_tok.value),
                op_tok.line,
                op_tok.column,
            )
        })?;
        self.advance();

        let value = self.parse_value()?;
        Ok(Condition {
            field,
            operator,
            value,
        })
    }

    fn parse_field(&mut self) -> Result<String, CclSyntaxError> {
        let tok = self.current().clone();
        if tok.kind != TokenKind::Identifier {
            return Err(CclSyntaxError::new(
                format!("Expected field identifier, got '{}'", tok.value),
                tok.line,
                tok.column,
            ));
        }
        let mut name = tok.value;
        self.advance();

        while self.check(TokenKind::Dot) {
            self.advance();
            let next = self.current().clone();
            if next.kind != TokenKind::Identifier {
                return Err(CclSyntaxError::new(
                    format!(
                        "Expected identifier after dot in field, got '{}'",
                        next.value
                    ),
                    next.line,
                    next.column,
                ));
            }
            name.push('.');
            name.push_str(&next.value);
            self.advance();
        }

        Ok(name)
    }

    fn parse_value(&mut self) -> Result<ConditionValue, CclSyntaxError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Str => {
                self.advance();
                Ok(ConditionValue::Str(tok.value))
            }
            TokenKind::Number => {
                let n = self.parse_signed_number(&tok)?;
                self.advance();
                Ok(ConditionValue::Int(n))
            }
            TokenKind::Identifier => {
                self.advance();
                match tok.value.as_str() {
                    "true" => Ok(ConditionValue::Bool(true)),
                    "false" => Ok(ConditionValue::Bool(false)),
                    _ => Ok(ConditionValue::Str(tok.value)),
                }
            }
            TokenKind::LBracket => Ok(ConditionValue::List(self.parse_array()?)),
            _ => Err(CclSyntaxError::new(
                format!(
                    "Expected value (string, number, boolean, or array), got '{}'",
                    tok.value
                ),
                tok.line,
                tok.column,
            )),
        }
    }

    /// Array elements are stringified: `[5, 'a', b]` parses to the list
    /// `["5", "a", "b"]`.
    fn parse_array(&mut self) -> Result<Vec<String>, CclSyntaxError> {
        self.expect(TokenKind::LBracket, "Expected '['")?;
        let mut values = Vec::new();

        if !self.check(TokenKind::RBracket) {
            values.push(self.parse_scalar_value()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                values.push(self.parse_scalar_value()?);
            }
        }

        self.expect(TokenKind::RBracket, "Expected ']'")?;
        Ok(values)
    }

    fn parse_scalar_value(&mut self) -> Result<String, CclSyntaxError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Str | TokenKind::Identifier => {
                self.advance();
                Ok(tok.value)
            }
            TokenKind::Number => {
                self.advance();
                Ok(tok.value)
            }
            _ => Err(CclSyntaxError::new(
                format!("Expected scalar value in array, got '{}'", tok.value),
                tok.line,
                tok.column,
            )),
        }
    }

    fn parse_optional_severity(&mut self) -> Result<Severity, CclSyntaxError> {
        if !self.check(TokenKind::Severity) {
            return Ok(Severity::default());
        }
        self.advance();

        let tok = self.current().clone();
        if tok.kind != TokenKind::Identifier {
            return Err(CclSyntaxError::new(
                format!(
                    "Expected severity level (critical, high, medium, low), got '{}'",
                    tok.value
                ),
                tok.line,
                tok.column,
            ));
        }
        let severity = Severity::parse(&tok.value.to_lowercase()).ok_or_else(|| {
            CclSyntaxError::new(
                format!(
                    "Invalid severity level '{}', expected critical, high, medium, or low",
                    tok.value
                ),
                tok.line,
                tok.column,
            )
        })?;
        self.advance();
        Ok(severity)
    }

    fn parse_number(&mut self, tok: &Token) -> Result<u64, CclSyntaxError> {
        tok.value.parse::<u64>().map_err(|_| {
            CclSyntaxError::new(
                format!("Number '{}' is out of range", tok.value),
                tok.line,
                tok.column,
            )
        })
    }

    fn parse_signed_number(&mut self, tok: &Token) -> Result<i64, CclSyntaxError> {
        tok.value.parse::<i64>().map_err(|_| {
            CclSyntaxError::new(
                format!("Number '{}' is out of range", tok.value),
                tok.line,
                tok.column,
            )
        })
    }

    // -- Cursor utilities --

    fn current(&self) -> &Token {
        // tokenize() always terminates the stream with Eof; clamp as a
        // belt against cursor overrun.
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, CclSyntaxError> {
        let tok = self.current().clone();
        if tok.kind != kind {
            let got = if tok.kind == TokenKind::Eof {
                "end of input".to_string()
            } else {
                format!("'{}' ({:?})", tok.value, tok.kind)
            };
            return Err(CclSyntaxError::new(
                format!("{message}, but got {got}"),
                tok.line,
                tok.column,
            ));
        }
        self.advance();
        Ok(tok)
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn skip_separators(&mut self) {
        while matches!(
            self.current().kind,
            TokenKind::Newline | TokenKind::Comment
        ) {
            self.advance();
        }
    }
}
