//! Note tag codec.
//!
//! Mutable protocol state lives inside free-text note fields as
//! `[NAME]value[/NAME]` segments. Notes are hand-editable in the invoicing
//! SaaS UI, so every reader here fails open: a malformed or unterminated tag
//! is treated as absent, never as an error. Writers preserve all unrelated
//! text around the tags.
//!
//! The syntax is load-bearing: historical notes already stored in the SaaS
//! use exactly this encoding, so it must be kept bit-for-bit.

use chrono::{DateTime, NaiveDate};

fn open_marker(name: &str) -> String {
    format!("[{name}]")
}

fn close_marker(name: &str) -> String {
    format!("[/{name}]")
}

/// Locate the first well-formed `[name]...[/name]` segment.
///
/// Returns `(open_start, value_start, value_end, close_end)` byte offsets.
fn find_tag(text: &str, name: &str) -> Option<(usize, usize, usize, usize)> {
    let open = open_marker(name);
    let close = close_marker(name);

    let open_start = text.find(&open)?;
    let value_start = open_start + open.len();
    let value_end = value_start + text[value_start..].find(&close)?;
    let close_end = value_end + close.len();

    Some((open_start, value_start, value_end, close_end))
}

/// Extract the value of the first `[name]...[/name]` occurrence, verbatim.
///
/// Returns `None` when the tag is absent or unterminated.
pub fn parse_tag(text: &str, name: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let (_, value_start, value_end, _) = find_tag(text, name)?;
    Some(text[value_start..value_end].to_string())
}

/// Replace the tag value in place, or append the tag at the end of the text.
///
/// Appending separates the tag from existing content with a single space and
/// never introduces a newline; multiple flags are expected to coexist on one
/// line so the SaaS does not mangle multi-line notes.
pub fn upsert_tag(text: &str, name: &str, value: &str) -> String {
    if let Some((_, value_start, value_end, _)) = find_tag(text, name) {
        return format!("{}{}{}", &text[..value_start], value, &text[value_end..]);
    }

    let tag = format!("{}{}{}", open_marker(name), value, close_marker(name));
    if text.trim().is_empty() {
        tag
    } else {
        format!("{} {}", text.trim_end(), tag)
    }
}

/// Strip the first well-formed occurrence of the tag and tidy the remains.
///
/// Collapses the double whitespace and blank lines left behind; returns an
/// empty string when nothing else was in the note.
pub fn remove_tag(text: &str, name: &str) -> String {
    match find_tag(text, name) {
        Some((open_start, _, _, close_end)) => {
            let remainder = format!("{}{}", &text[..open_start], &text[close_end..]);
            collapse_whitespace(&remainder)
        }
        None => text.to_string(),
    }
}

/// Read a boolean tag. Only the literal `true` counts; `false`, malformed
/// values, and absence all read as `false`.
pub fn parse_bool_tag(text: &str, name: &str) -> bool {
    parse_tag(text, name).as_deref() == Some("true")
}

/// Render a boolean tag value
pub fn bool_value(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Read a date tag: `YYYY-MM-DD` or a full ISO-8601 timestamp.
///
/// Unparseable dates read as absent.
pub fn parse_date_tag(text: &str, name: &str) -> Option<NaiveDate> {
    parse_date_value(parse_tag(text, name)?.trim())
}

/// Parse a `YYYY-MM-DD` or ISO-8601 timestamp string into a date.
pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|ts| ts.date())
}

/// Collapse runs of spaces/tabs and drop blank lines left by tag removal.
fn collapse_whitespace(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(collapse_spaces)
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

fn collapse_spaces(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_gap = false;
    for ch in line.chars() {
        if ch == ' ' || ch == '\t' {
            if !in_gap {
                out.push(' ');
            }
            in_gap = true;
        } else {
            out.push(ch);
            in_gap = false;
        }
    }
    out.trim().to_string()
}
