// src/lint/report.rs

use std::fmt;
use std::path::PathBuf;

use crate::lint::Violation;
use crate::types::Severity;

/// Violations found in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub violations: Vec<Violation>,
}

/// Violations for a whole lint run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub files: Vec<FileReport>,
}

impl LintReport {
    pub fn push(&mut self, file: FileReport) {
        if !file.violations.is_empty() {
            self.files.push(file);
        }
    }

    fn count(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .flat_map(|f| &f.violations)
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warn)
    }

    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }
}

fn symbol(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "✖",
        _ => "⚠",
    }
}

/// Human-readable report in the style of stylelint's `string` formatter:
/// a path header per file, one aligned line per violation, and a totals line.
impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f)?;
            writeln!(f, "{}", file.path.display())?;

            let positions: Vec<String> = file
                .violations
                .iter()
                .map(|v| format!("{}:{}", v.line, v.column))
                .collect();
            let pos_width = positions.iter().map(String::len).max().unwrap_or(0);
            let msg_width = file
                .violations
                .iter()
                .map(|v| v.message.chars().count())
                .max()
                .unwrap_or(0);

            for (v, pos) in file.violations.iter().zip(&positions) {
                writeln!(
                    f,
                    " {pos:<pos_width$}  {}  {:<msg_width$}  {}",
                    symbol(v.severity),
                    v.message,
                    v.rule
                )?;
            }
        }

        let errors = self.error_count();
        let warnings = self.warning_count();
        let total = errors + warnings;
        if total > 0 {
            writeln!(f)?;
            writeln!(
                f,
                "{total} problem{} ({errors} error{}, {warnings} warning{})",
                if total == 1 { "" } else { "s" },
                if errors == 1 { "" } else { "s" },
                if warnings == 1 { "" } else { "s" },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::file_report;

    fn violation(line: usize, rule: &'static str, severity: Severity, message: &str) -> Violation {
        Violation {
            line,
            column: 3,
            rule,
            severity,
            message: message.to_string(),
        }
    }

    #[test]
    fn renders_header_aligned_lines_and_totals() {
        let mut report = LintReport::default();
        report.push(file_report(
            "resources/js/app.js",
            vec![
                violation(12, "eqeqeq", Severity::Warn, "Expected '===' and instead saw '=='."),
                violation(2, "no-debugger", Severity::Error, "Unexpected 'debugger' statement."),
            ],
        ));

        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "resources/js/app.js");
        assert!(lines[2].starts_with(" 2:3   ✖  Unexpected 'debugger' statement."));
        assert!(lines[2].ends_with("no-debugger"));
        assert!(lines[3].starts_with(" 12:3  ⚠"));
        assert_eq!(lines.last(), Some(&"2 problems (1 error, 1 warning)"));
    }

    #[test]
    fn clean_files_are_not_listed() {
        let mut report = LintReport::default();
        report.push(file_report("a.scss", Vec::new()));
        assert!(report.is_clean());
        assert_eq!(report.to_string(), "");
    }
}
