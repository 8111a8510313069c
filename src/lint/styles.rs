// src/lint/styles.rs

//! SCSS rules.
//!
//! `syntax` compiles the file through grass; the remaining rules walk a
//! comment-stripped copy of the source with a small brace-aware scanner, so
//! reported offsets line up with the original text.

use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::fs::FileSystem;
use crate::lint::{line_col, RuleSet, Violation};
use crate::transform::scss::{self, is_partial};
use crate::types::Severity;

pub const RULE_IDS: &[&str] = &[
    "syntax",
    "block-no-empty",
    "color-no-invalid-hex",
    "declaration-block-no-duplicate-properties",
];

pub const DEFAULT_RULES: &[(&str, Severity)] = &[
    ("syntax", Severity::Error),
    ("block-no-empty", Severity::Error),
    ("color-no-invalid-hex", Severity::Error),
    ("declaration-block-no-duplicate-properties", Severity::Error),
];

static ERROR_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+):(\d+)\s+root stylesheet").expect("valid regex"));

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9A-Za-z]+)").expect("valid regex"));

static PROPERTY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

/// Lint one SCSS file.
///
/// `path` locates the file for import resolution; partials are only checked
/// by the text rules since they rarely compile on their own.
pub fn lint_source(
    fs: &dyn FileSystem,
    path: &Path,
    source: &str,
    rules: &RuleSet,
) -> Vec<Violation> {
    let mut out = Vec::new();

    if rules.is_enabled("syntax") && !is_partial(path) {
        let load_dir = path.parent().unwrap_or(Path::new("."));
        if let Err(err) = scss::compile(fs, source, load_dir) {
            let text = err.to_string();
            let (line, column) = ERROR_POSITION
                .captures(&text)
                .and_then(|c| Some((c[1].parse().ok()?, c[2].parse().ok()?)))
                .unwrap_or((1, 1));
            let message = text
                .lines()
                .next()
                .unwrap_or("invalid stylesheet")
                .trim_start_matches("Error: ")
                .to_string();
            out.extend(rules.violation("syntax", line, column, format!("{message} (syntax)")));
        }
    }

    let stripped = strip_comments(source);
    scan_blocks(&stripped, rules, &mut out);
    out
}

/// Replace comments with spaces, keeping newlines and byte offsets intact.
fn strip_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            out.push(b);
            if b == b'\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1]);
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match (b, bytes.get(i + 1).copied()) {
            (b'"' | b'\'', _) => {
                quote = Some(b);
                out.push(b);
                i += 1;
            }
            (b'/', Some(b'*')) => {
                let end = source[i + 2..].find("*/").map(|e| i + 2 + e + 2).unwrap_or(bytes.len());
                out.extend(bytes[i..end].iter().map(|&c| if c == b'\n' { b'\n' } else { b' ' }));
                i = end;
            }
            (b'/', Some(b'/')) if i == 0 || bytes[i - 1] != b':' => {
                let end = source[i..].find('\n').map(|e| i + e).unwrap_or(bytes.len());
                out.extend(std::iter::repeat(b' ').take(end - i));
                i = end;
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    // Only ASCII bytes were replaced, so the result is still UTF-8.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Property names seen in one open block.
#[derive(Default)]
struct Block {
    open_at: usize,
    props: HashSet<String>,
}

fn scan_blocks(text: &str, rules: &RuleSet, out: &mut Vec<Violation>) {
    let bytes = text.as_bytes();
    let mut stack: Vec<Block> = Vec::new();
    let mut seg_start = 0;
    let mut parens = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b'{' if i > 0 && bytes[i - 1] == b'#' => {
                // `#{...}` interpolation is part of the surrounding segment.
                if let Some(end) = text[i..].find('}') {
                    i += end;
                }
            }
            b'{' => {
                stack.push(Block {
                    open_at: i,
                    props: HashSet::new(),
                });
                seg_start = i + 1;
            }
            b';' if parens == 0 => {
                if let Some(block) = stack.last_mut() {
                    check_declaration(text, seg_start, i, block, rules, out);
                }
                seg_start = i + 1;
            }
            b'}' => {
                if let Some(mut block) = stack.pop() {
                    check_declaration(text, seg_start, i, &mut block, rules, out);
                    if text[block.open_at + 1..i].trim().is_empty() {
                        let (line, column) = line_col(text, block.open_at);
                        out.extend(rules.violation(
                            "block-no-empty",
                            line,
                            column,
                            "Unexpected empty block",
                        ));
                    }
                }
                seg_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
}

/// Byte ranges of `value` that are quoted strings or `url(...)` arguments.
/// Hex-like text there is not a colour.
fn opaque_spans(value: &str) -> Vec<Range<usize>> {
    let bytes = value.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                let start = i;
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i = (i + 1).min(bytes.len());
                spans.push(start..i);
            }
            b'(' if value[..i].to_ascii_lowercase().ends_with("url") => {
                let start = i;
                i = value[i..].find(')').map_or(bytes.len(), |close| i + close + 1);
                spans.push(start..i);
            }
            _ => i += 1,
        }
    }
    spans
}

fn check_declaration(
    text: &str,
    start: usize,
    end: usize,
    block: &mut Block,
    rules: &RuleSet,
    out: &mut Vec<Violation>,
) {
    let segment = &text[start..end];
    let trimmed = segment.trim_start();
    let offset = start + (segment.len() - trimmed.len());
    let Some(colon) = trimmed.find(':') else {
        return;
    };

    let name = trimmed[..colon].trim();
    if !PROPERTY_NAME.is_match(name) {
        return;
    }
    let value_offset = offset + colon + 1;
    let value = &trimmed[colon + 1..];

    let opaque = opaque_spans(value);
    for m in HEX_COLOR.captures_iter(value) {
        let (whole, hex) = match (m.get(0), m.get(1)) {
            (Some(w), Some(h)) => (w, h.as_str()),
            _ => continue,
        };
        if opaque.iter().any(|span| span.contains(&whole.start())) {
            continue;
        }
        let valid = matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            let (line, column) = line_col(text, value_offset + whole.start());
            out.extend(rules.violation(
                "color-no-invalid-hex",
                line,
                column,
                format!("Unexpected invalid hex color \"{}\"", whole.as_str()),
            ));
        }
    }

    let key = name.to_ascii_lowercase();
    if !block.props.insert(key) {
        let (line, column) = line_col(text, offset);
        out.extend(rules.violation(
            "declaration-block-no-duplicate-properties",
            line,
            column,
            format!("Unexpected duplicate \"{name}\""),
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn lint(src: &str) -> Vec<Violation> {
        lint_with(src, BTreeMap::new())
    }

    fn lint_with(src: &str, overrides: BTreeMap<String, Severity>) -> Vec<Violation> {
        let fs = MockFileSystem::new();
        let rules = RuleSet::new(DEFAULT_RULES, &overrides);
        lint_source(&fs, Path::new("resources/scss/main.scss"), src, &rules)
    }

    fn rule_ids(v: &[Violation]) -> Vec<&'static str> {
        v.iter().map(|v| v.rule).collect()
    }

    #[test]
    fn clean_stylesheet_has_no_violations() {
        let src = "$brand: #336699;\n$gap: 4px;\n#header a:hover { color: $brand; }\n.x { width: calc(100% - #{$gap}); }\n";
        assert!(lint(src).is_empty(), "{:?}", lint(src));
    }

    #[test]
    fn empty_blocks_are_reported_at_the_brace() {
        let v = lint("a {\n  color: red;\n}\n.b {\n}\n");
        assert_eq!(rule_ids(&v), vec!["block-no-empty"]);
        assert_eq!((v[0].line, v[0].column), (4, 4));
    }

    #[test]
    fn invalid_hex_in_values_only() {
        let overrides = BTreeMap::from([("syntax".to_string(), Severity::Off)]);
        let v = lint_with(
            "#main {\n  color: #12345;\n  background: #fff;\n  fill: url(#gradient);\n  background-image: url(\"sprite.svg#icon\");\n  mask: URL(  icons.svg#zz );\n}\nli::before { content: \"#1\"; quotes: '#x' '#y'; border: 1px solid #ggg; }\n",
            overrides,
        );
        assert_eq!(rule_ids(&v), vec!["color-no-invalid-hex", "color-no-invalid-hex"]);
        assert_eq!((v[0].line, v[0].column), (2, 10));
        assert!(v[0].message.contains("#12345"));
        assert!(v[1].message.contains("#ggg"));
    }

    #[test]
    fn duplicate_properties_in_the_same_block() {
        let v = lint("a {\n  color: red;\n  &:hover { color: blue; }\n  Color: green;\n}\n");
        assert_eq!(rule_ids(&v), vec!["declaration-block-no-duplicate-properties"]);
        assert_eq!(v[0].line, 4);
    }

    #[test]
    fn commented_out_code_is_ignored() {
        let v = lint("/* a {} */\n// b { color: #zz; }\nc { color: red; }\n");
        assert!(v.is_empty(), "{v:?}");
    }

    #[test]
    fn compile_errors_are_syntax_violations() {
        let v = lint("a { color: red;\n");
        assert!(v.iter().any(|v| v.rule == "syntax" && v.severity == Severity::Error));
    }

    #[test]
    fn partials_skip_the_syntax_rule() {
        let fs = MockFileSystem::new();
        let rules = RuleSet::new(DEFAULT_RULES, &BTreeMap::new());
        let v = lint_source(
            &fs,
            Path::new("resources/scss/_buttons.scss"),
            ".btn { color: $brand; }\n",
            &rules,
        );
        assert!(v.is_empty(), "{v:?}");
    }
}
