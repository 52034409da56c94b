//! # Verification Reports
//!
//! Shared result types for document and identity verification. Verifiers
//! run every check and report each outcome; a failed check never aborts
//! the remaining checks. Callers decide which failures are fatal.

use serde::Serialize;

/// The outcome of a single named verification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    /// Stable machine-readable check name (e.g. `"signature_valid"`).
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Human-readable outcome description.
    pub message: String,
}

impl Check {
    /// Construct a check result.
    pub fn new(name: impl Into<String>, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            message: message.into(),
        }
    }
}

/// A full verification report: the conjunction of all checks plus the
/// individual outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// True only when every check passed.
    pub valid: bool,
    /// All check outcomes, in the order they were run.
    pub checks: Vec<Check>,
}

impl Report {
    /// Aggregate a list of check outcomes into a report.
    pub fn from_checks(checks: Vec<Check>) -> Self {
        let valid = checks.iter().all(|c| c.passed);
        Self { valid, checks }
    }

    /// Look up a check outcome by name.
    pub fn check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Names of all failed checks.
    pub fn failed(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect()
    }
}
