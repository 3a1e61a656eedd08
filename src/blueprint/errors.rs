//! Error types for the blueprint domain

use std::fmt;
use thiserror::Error;

/// One schema or invariant violation, located by a JSON-path-like string such
/// as `resources[1].endpoints[0].method`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A candidate blueprint failed validation. Lists every violation found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("blueprint failed validation with {} violation(s): {}", .violations.len(), format_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// True if any violation message mentions `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.message.contains(needle) || v.path.contains(needle))
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
