// src/lint/scripts.rs

//! Script rules, checked on the swc AST of each file parsed as a classic
//! script.

use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceMap, Span, Spanned};
use swc_core::ecma::ast::{
    BinExpr, BinaryOp, BlockStmt, DebuggerStmt, EsVersion, Stmt, SwitchStmt, TryStmt,
};
use swc_core::ecma::parser::{parse_file_as_script, EsConfig, Syntax};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::lint::{RuleSet, Violation};
use crate::types::Severity;

pub const RULE_IDS: &[&str] = &["syntax", "no-debugger", "no-empty", "eqeqeq"];

pub const DEFAULT_RULES: &[(&str, Severity)] = &[
    ("syntax", Severity::Error),
    ("no-debugger", Severity::Error),
    ("no-empty", Severity::Error),
    ("eqeqeq", Severity::Warn),
];

/// Lint one script. `name` is only used in parser diagnostics.
pub fn lint_source(name: &str, source: &str, rules: &RuleSet) -> Vec<Violation> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Custom(name.to_string()), source.to_string());

    let mut recovered = Vec::new();
    let parsed = parse_file_as_script(
        &fm,
        Syntax::Es(EsConfig::default()),
        EsVersion::EsNext,
        None,
        &mut recovered,
    );

    let mut checker = RuleChecker {
        cm: &cm,
        rules,
        found: Vec::new(),
    };

    for err in &recovered {
        checker.report("syntax", err.span(), format!("Parsing error: {}", err.kind().msg()));
    }

    match parsed {
        Ok(script) => script.visit_with(&mut checker),
        Err(err) => {
            checker.report("syntax", err.span(), format!("Parsing error: {}", err.kind().msg()));
        }
    }

    checker.found
}

struct RuleChecker<'a> {
    cm: &'a Lrc<SourceMap>,
    rules: &'a RuleSet,
    found: Vec<Violation>,
}

impl RuleChecker<'_> {
    fn report(&mut self, rule: &'static str, span: Span, message: impl Into<String>) {
        let loc = self.cm.lookup_char_pos(span.lo);
        let column = loc.col.0 + 1;
        self.found
            .extend(self.rules.violation(rule, loc.line, column, message));
    }

    fn check_empty(&mut self, block: &BlockStmt) {
        if block.stmts.is_empty() {
            self.report("no-empty", block.span, "Empty block statement.");
        }
    }
}

impl Visit for RuleChecker<'_> {
    fn visit_debugger_stmt(&mut self, n: &DebuggerStmt) {
        self.report("no-debugger", n.span, "Unexpected 'debugger' statement.");
    }

    fn visit_stmt(&mut self, n: &Stmt) {
        // Function bodies are not statements, so only standalone blocks land here.
        if let Stmt::Block(block) = n {
            self.check_empty(block);
        }
        n.visit_children_with(self);
    }

    fn visit_try_stmt(&mut self, n: &TryStmt) {
        self.check_empty(&n.block);
        if let Some(handler) = &n.handler {
            self.check_empty(&handler.body);
        }
        if let Some(finalizer) = &n.finalizer {
            self.check_empty(finalizer);
        }
        n.visit_children_with(self);
    }

    fn visit_switch_stmt(&mut self, n: &SwitchStmt) {
        if n.cases.is_empty() {
            self.report("no-empty", n.span, "Empty switch statement.");
        }
        n.visit_children_with(self);
    }

    fn visit_bin_expr(&mut self, n: &BinExpr) {
        let (expected, actual) = match n.op {
            BinaryOp::EqEq => ("===", "=="),
            BinaryOp::NotEq => ("!==", "!="),
            _ => ("", ""),
        };
        if !expected.is_empty() {
            self.report(
                "eqeqeq",
                n.span,
                format!("Expected '{expected}' and instead saw '{actual}'."),
            );
        }
        n.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lint(src: &str) -> Vec<Violation> {
        let rules = RuleSet::new(DEFAULT_RULES, &BTreeMap::new());
        lint_source("app.js", src, &rules)
    }

    #[test]
    fn clean_script_passes() {
        let v = lint("var x = 1;\nfunction f(a) { return a === x; }\n");
        assert!(v.is_empty(), "{v:?}");
    }

    #[test]
    fn debugger_is_an_error_with_position() {
        let v = lint("var a = 1;\n  debugger;\n");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].rule, "no-debugger");
        assert_eq!(v[0].severity, Severity::Error);
        assert_eq!((v[0].line, v[0].column), (2, 3));
    }

    #[test]
    fn loose_equality_is_a_warning() {
        let v = lint("if (a == b) { run(); }\n");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].rule, "eqeqeq");
        assert_eq!(v[0].severity, Severity::Warn);
    }

    #[test]
    fn empty_blocks_and_catch_clauses() {
        let v = lint("if (ok) {}\ntry { go(); } catch (e) {}\n");
        let rules: Vec<_> = v.iter().map(|v| v.rule).collect();
        assert_eq!(rules, vec!["no-empty", "no-empty"]);
        assert_eq!(v[1].line, 2);
    }

    #[test]
    fn empty_function_bodies_are_allowed() {
        assert!(lint("function noop() {}\n").is_empty());
    }

    #[test]
    fn parse_errors_are_syntax_violations() {
        let v = lint("var = ;\n");
        assert!(!v.is_empty());
        assert_eq!(v[0].rule, "syntax");
        assert!(v[0].message.starts_with("Parsing error"));
    }

    #[test]
    fn rules_can_be_switched_off() {
        let overrides = BTreeMap::from([("no-debugger".to_string(), Severity::Off)]);
        let rules = RuleSet::new(DEFAULT_RULES, &overrides);
        assert!(lint_source("a.js", "debugger;\n", &rules).is_empty());
    }
}
