//! `/`-separated path helpers.
//!
//! Resource paths are opaque keys that happen to look like file paths. These
//! helpers work on them as strings so that map keys stay byte-identical to
//! what the file finder reported. The empty string stands for the root
//! directory.

use path_clean::PathClean;
use std::path::Path;

/// Directory part of `path`, or `""` when `path` has no `/`.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Final segment of `path`.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join `child` onto `dir` and normalize `.` and `..` segments.
pub fn join(dir: &str, child: &str) -> String {
    let joined = if dir.is_empty() {
        Path::new(child).clean()
    } else {
        Path::new(dir).join(child).clean()
    };
    let joined = joined.to_string_lossy().replace('\\', "/");
    if joined == "." { String::new() } else { joined }
}

/// `path` relative to `dir`, when `path` lies strictly inside `dir`.
pub fn strip_dir<'a>(dir: &str, path: &'a str) -> Option<&'a str> {
    if dir.is_empty() {
        return (!path.is_empty()).then_some(path);
    }
    path.strip_prefix(dir)?.strip_prefix('/').filter(|rest| !rest.is_empty())
}

/// Split into non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
