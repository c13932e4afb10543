//! File discovery.
//!
//! The update task consumes a finder as a black box: one call, one complete
//! listing of `(path, mtime)` pairs. [`WalkFinder`] is the native
//! implementation; tests substitute in-memory listings.

use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::error::UpdateError;

/// Produces the authoritative file listing for one update cycle.
#[async_trait]
pub trait FileFinder: Send + Sync + fmt::Debug {
    /// Every relevant file exactly once, with its mtime in milliseconds.
    async fn find(&self) -> Result<Vec<(String, u64)>, UpdateError>;
}

/// Fixed listings are finders too.
#[async_trait]
impl FileFinder for Vec<(String, u64)> {
    async fn find(&self) -> Result<Vec<(String, u64)>, UpdateError> {
        Ok(self.clone())
    }
}

type IgnoreFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Recursive directory walk over a set of scan directories.
///
/// Paths are reported relative to `root` with `/` separators. Symbolic
/// links are not followed.
#[derive(Clone)]
pub struct WalkFinder {
    root: PathBuf,
    scan_dirs: Vec<String>,
    extensions: Vec<String>,
    ignore: Vec<IgnoreFn>,
}

impl fmt::Debug for WalkFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkFinder")
            .field("root", &self.root)
            .field("scan_dirs", &self.scan_dirs)
            .field("extensions", &self.extensions)
            .field("ignore", &self.ignore.len())
            .finish()
    }
}

impl WalkFinder {
    pub fn new(root: impl Into<PathBuf>, scan_dirs: Vec<String>) -> Self {
        Self {
            root: root.into(),
            scan_dirs,
            extensions: Vec::new(),
            ignore: Vec::new(),
        }
    }

    /// Only report files ending in one of `extensions`. Empty means all.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Drop paths for which `predicate` returns true.
    pub fn ignore(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.ignore.push(Arc::new(predicate));
        self
    }

    /// Drop paths matching `pattern`.
    pub fn ignore_pattern(self, pattern: Regex) -> Self {
        self.ignore(move |path| pattern.is_match(path))
    }

    fn accepts(&self, path: &str) -> bool {
        let extension_ok =
            self.extensions.is_empty() || self.extensions.iter().any(|ext| path.ends_with(ext.as_str()));
        extension_ok && !self.ignore.iter().any(|ignored| ignored(path))
    }

    fn walk(&self) -> Vec<(String, u64)> {
        let mut files = Vec::new();
        for dir in &self.scan_dirs {
            let start = self.root.join(dir);
            if !start.is_dir() {
                tracing::debug!(dir = %start.display(), "scan directory missing");
                continue;
            }

            for entry in WalkDir::new(&start).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(path) = relative_path(&self.root, entry.path()) else {
                    continue;
                };
                if !self.accepts(&path) {
                    continue;
                }
                let mtime = entry
                    .metadata()
                    .ok()
                    .and_then(|meta| meta.modified().ok())
                    .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                    .map(|elapsed| elapsed.as_millis() as u64)
                    .unwrap_or(0);
                files.push((path, mtime));
            }
        }
        files
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[async_trait]
impl FileFinder for WalkFinder {
    async fn find(&self) -> Result<Vec<(String, u64)>, UpdateError> {
        let finder = self.clone();
        let files = tokio::task::spawn_blocking(move || finder.walk())
            .await
            .map_err(|err| UpdateError::Discovery(err.to_string()))?;
        tracing::debug!(files = files.len(), "walk finished");
        Ok(files)
    }
}
