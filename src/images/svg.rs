// src/images/svg.rs

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::config::SvgOptions;

fn is_metadata(name: &[u8]) -> bool {
    name == b"metadata"
}

/// Elements whose character data is rendered or parsed, so whitespace in
/// them is significant.
fn keeps_text(name: &[u8]) -> bool {
    matches!(name, b"text" | b"tspan" | b"textPath" | b"title" | b"desc" | b"style")
}

fn is_bare_group(e: &BytesStart<'_>) -> bool {
    e.name().as_ref() == b"g" && e.attributes().next().is_none()
}

/// Copy of `e` without the attribute named `attr`.
fn without_attr(e: &BytesStart<'_>, attr: &[u8]) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for a in e.attributes() {
        let a = a?;
        if a.key.as_ref() != attr {
            out.push_attribute((a.key.as_ref(), a.value.as_ref()));
        }
    }
    Ok(out)
}

/// Minify SVG markup.
///
/// Always drops whitespace-only text between elements; text inside
/// [`keeps_text`] elements is copied unchanged. Depending on `opts`: drops
/// comments and `<metadata>`, unwraps `<g>` elements that carry no
/// attributes, and strips `viewBox` from the root `<svg>`.
pub fn minify(text: &str, opts: &SvgOptions) -> Result<String> {
    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::new());

    // Depth inside a dropped <metadata> subtree.
    let mut skip_depth = 0usize;
    // One entry per open element: (tags dropped, keeps text).
    let mut open: Vec<(bool, bool)> = Vec::new();
    // Open elements whose text is significant.
    let mut in_text = 0usize;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("svg: parse error at byte {}", reader.buffer_position()))?;

        match event {
            Event::Eof => break,
            Event::Start(e) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }
                if opts.remove_metadata && is_metadata(e.name().as_ref()) {
                    skip_depth = 1;
                    continue;
                }
                if opts.collapse_groups && is_bare_group(&e) {
                    open.push((true, false));
                    continue;
                }
                let keeps = keeps_text(e.name().as_ref());
                in_text += usize::from(keeps);
                open.push((false, keeps));
                if opts.remove_view_box && e.name().as_ref() == b"svg" {
                    writer.write_event(Event::Start(without_attr(&e, b"viewBox")?))?;
                } else {
                    writer.write_event(Event::Start(e))?;
                }
            }
            Event::End(e) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                let (dropped, keeps) = open.pop().unwrap_or((false, false));
                in_text -= usize::from(keeps);
                if !dropped {
                    writer.write_event(Event::End(e))?;
                }
            }
            Event::Empty(e) => {
                if skip_depth > 0
                    || (opts.remove_metadata && is_metadata(e.name().as_ref()))
                    || (opts.collapse_groups && is_bare_group(&e))
                {
                    continue;
                }
                if opts.remove_view_box && e.name().as_ref() == b"svg" {
                    writer.write_event(Event::Empty(without_attr(&e, b"viewBox")?))?;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Comment(_) if opts.remove_comments => {}
            Event::Text(t) if skip_depth == 0 => {
                if in_text > 0 || !t.iter().all(u8::is_ascii_whitespace) {
                    writer.write_event(Event::Text(t))?;
                }
            }
            other => {
                if skip_depth == 0 {
                    writer.write_event(other)?;
                }
            }
        }
    }

    String::from_utf8(writer.into_inner()).context("svg: output is not UTF-8")
}
