// src/lint/mod.rs

//! Lint engines for styles and scripts.
//!
//! Each engine exposes its rule ids and default severities; a [`RuleSet`]
//! merges the defaults with the `[styles.rules]` / `[scripts.rules]` tables
//! from the config. Violations are collected into a [`LintReport`] which the
//! lint tasks print and then judge against the group's lint policy.

pub mod report;
pub mod scripts;
pub mod styles;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::types::Severity;

pub use report::{FileReport, LintReport};

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Effective severities for one group.
#[derive(Debug, Clone)]
pub struct RuleSet {
    severities: BTreeMap<&'static str, Severity>,
}

impl RuleSet {
    /// Start from `defaults` and apply the configured overrides.
    ///
    /// Unknown ids in `overrides` are ignored here; config validation
    /// already rejected them.
    pub fn new(defaults: &[(&'static str, Severity)], overrides: &BTreeMap<String, Severity>) -> Self {
        let mut severities: BTreeMap<&'static str, Severity> = defaults.iter().copied().collect();
        for (rule, severity) in severities.iter_mut() {
            if let Some(over) = overrides.get(*rule) {
                *severity = *over;
            }
        }
        Self { severities }
    }

    pub fn severity(&self, rule: &str) -> Severity {
        self.severities.get(rule).copied().unwrap_or(Severity::Off)
    }

    pub fn is_enabled(&self, rule: &str) -> bool {
        self.severity(rule) != Severity::Off
    }

    /// Build a violation for `rule` at its configured severity, or `None`
    /// when the rule is off.
    pub fn violation(
        &self,
        rule: &'static str,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Option<Violation> {
        let severity = self.severity(rule);
        (severity != Severity::Off).then(|| Violation {
            line,
            column,
            rule,
            severity,
            message: message.into(),
        })
    }
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

/// Convenience for building a [`FileReport`].
pub fn file_report(path: impl Into<PathBuf>, mut violations: Vec<Violation>) -> FileReport {
    violations.sort_by_key(|v| (v.line, v.column));
    FileReport {
        path: path.into(),
        violations,
    }
}
