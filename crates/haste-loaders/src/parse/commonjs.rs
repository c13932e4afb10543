//! CommonJS dependency scraping.
//!
//! This is pattern matching, not parsing: comments are stripped first, then
//! `require('x')`-shaped calls are collected. Calls written as a member
//! access (`foo.require('x')`) are ignored.

use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*(?s:.)*?\*/").expect("static regex"));

static LINE_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//.+(?:\n|$)").expect("static regex"));

static REQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequire\s*\(\s*['"]([^"']+)["']\s*\)"#).expect("static regex")
});

/// Test files also treat `.map('x')` as a dependency declaration.
pub static TEST_REQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:\brequire|\.map)\s*\(\s*['"]([^"']+)["']\s*\)"#).expect("static regex")
});

static REQUIRE_DYNAMIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequireDynamic\s*\(\s*['"]([^"']+)["']"#).expect("static regex")
});

static REQUIRE_LAZY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\brequireLazy\s*\(\s*\[([^\]]*)\]").expect("static regex"));

static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([^"']+)["']"#).expect("static regex"));

fn strip_comments(code: &str) -> String {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(code, "");
    LINE_COMMENT_RE.replace_all(&without_blocks, "").into_owned()
}

fn push_unique(out: &mut Vec<String>, value: &str) {
    if !out.iter().any(|seen| seen == value) {
        out.push(value.to_string());
    }
}

/// Module names passed to `require()`, deduplicated, in source order.
pub fn extract_require_calls(code: &str) -> Vec<String> {
    extract_with(code, &REQUIRE_RE)
}

/// Like [`extract_require_calls`] with a caller-supplied pattern whose
/// first group is the module name.
pub fn extract_with(code: &str, pattern: &Regex) -> Vec<String> {
    let code = strip_comments(code);
    let mut out = Vec::new();
    for caps in pattern.captures_iter(&code) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if code[..whole.start()].ends_with('.') {
            continue;
        }
        push_unique(&mut out, name.as_str());
    }
    out
}

/// Targets of `requireDynamic('x')`.
pub fn extract_dynamic_requires(code: &str) -> Vec<String> {
    extract_with(code, &REQUIRE_DYNAMIC_RE)
}

/// Every module named in a `requireLazy([...])` list.
pub fn extract_lazy_requires(code: &str) -> Vec<String> {
    let code = strip_comments(code);
    let mut out = Vec::new();
    for list in REQUIRE_LAZY_RE.captures_iter(&code) {
        for quoted in QUOTED_RE.captures_iter(&list[1]) {
            push_unique(&mut out, &quoted[1]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_and_dedupes() {
        let code = r#"
            var a = require('a');
            var b = require( "b" );
            var again = require('a');
        "#;
        assert_eq!(extract_require_calls(code), vec!["a", "b"]);
    }

    #[test]
    fn test_ignores_comments_and_member_calls() {
        let code = r#"
            // require('commented')
            /* require('blocked')
               require('still-blocked') */
            foo.require('member');
            var ok = require('ok');
        "#;
        assert_eq!(extract_require_calls(code), vec!["ok"]);
    }

    #[test]
    fn test_require_at_start_of_file() {
        assert_eq!(extract_require_calls("require('first');"), vec!["first"]);
    }

    #[test]
    fn test_test_pattern_includes_map() {
        let code = "jest.dontMock('x'); mocks.map('y'); require('z');";
        assert_eq!(extract_with(code, &TEST_REQUIRE_RE), vec!["y", "z"]);
    }

    #[test]
    fn test_special_requires() {
        let code = "requireDynamic('dyn', fn); requireLazy(['l1', \"l2\"], cb);";
        assert_eq!(extract_dynamic_requires(code), vec!["dyn"]);
        assert_eq!(extract_lazy_requires(code), vec!["l1", "l2"]);
    }
}
