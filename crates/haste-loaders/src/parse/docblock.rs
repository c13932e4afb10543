//! Header docblock extraction.
//!
//! A header docblock is a `/** ... */` comment at the very start of a file
//! (leading whitespace allowed). Its `@directive value` lines drive most
//! per-file metadata.

use once_cell::sync::Lazy;
use regex::Regex;

static DOCBLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(/\*\*(?s:.)*?\*/)").expect("static regex"));

static DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@([\w\-]+)(?:\s+(.*))?$").expect("static regex"));

/// The header docblock of `source`, or `""` when the file has none.
pub fn extract(source: &str) -> &str {
    DOCBLOCK_RE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

/// `(name, value)` pairs for every directive in `docblock`, in order.
///
/// A directive's value may continue on following lines until the next
/// directive or a blank line.
pub fn parse(docblock: &str) -> Vec<(String, String)> {
    let body = docblock
        .trim()
        .trim_start_matches("/**")
        .trim_end_matches("*/");

    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut open = false;
    for line in body.lines() {
        let line = line.trim().trim_start_matches('*').trim();
        if line.is_empty() {
            open = false;
            continue;
        }
        if let Some(caps) = DIRECTIVE_RE.captures(line) {
            let value = caps.get(2).map_or("", |m| m.as_str().trim());
            pairs.push((caps[1].to_string(), value.to_string()));
            open = true;
        } else if open {
            if let Some((_, value)) = pairs.last_mut() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line);
            }
        }
    }
    pairs
}

/// Whitespace-separated words of a directive value.
pub fn words(value: &str) -> impl Iterator<Item = &str> {
    value.split_whitespace()
}
