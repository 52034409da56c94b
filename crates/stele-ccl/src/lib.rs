#![deny(missing_docs)]

//! # stele-ccl — Constraint Commitment Language
//!
//! The policy DSL of the Stele protocol. A CCL document is a newline-
//! separated list of statements:
//!
//! ```text
//! permit read on '/data/**'
//! deny file.write on '/etc/**' severity critical
//! require audit.log on '/finance/**'
//! limit api.call 100 per 1 hours
//! permit deploy on '/services/*' when user.role = 'admin' and env != 'prod'
//! ```
//!
//! The crate provides the full pipeline: [`tokenize`] → [`parse`] →
//! [`evaluate`] / [`check_rate_limit`], plus [`validate_narrowing`] for
//! delegation chains, [`merge`] for deny-wins composition, and
//! [`serialize`] to render a document back to source.
//!
//! Evaluation is default-deny: an action is permitted only when a permit
//! rule matches and no equally- or more-specific deny rule does.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod matcher;
pub mod merge;
pub mod narrowing;
pub mod parser;
pub mod serialize;
pub mod token;

pub use ast::{
    BoolOp, CclDocument, CompoundCondition, Condition, ConditionNode, ConditionValue, Effect,
    LimitStatement, Operator, PermitDenyStatement, RequireStatement, Severity, Statement,
};
pub use error::CclSyntaxError;
pub use eval::{check_rate_limit, evaluate, evaluate_condition, EvaluationResult, RateLimitResult};
pub use lexer::tokenize;
pub use matcher::{match_action, match_resource, specificity};
pub use merge::merge;
pub use narrowing::{validate_narrowing, NarrowingResult, NarrowingViolation};
pub use parser::parse;
pub use serialize::serialize;
pub use token::{Token, TokenKind};
