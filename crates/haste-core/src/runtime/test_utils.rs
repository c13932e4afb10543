//! In-memory runtime for tests.
//!
//! `TestRuntime` keeps a virtual file tree behind a mutex so loader and
//! serializer tests can run without touching disk. It also counts reads,
//! which lets tests assert that a loader short-circuited an update.

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Runtime, RuntimeError, RuntimeResult};

#[derive(Debug, Clone)]
struct Entry {
    content: Vec<u8>,
    mtime: u64,
}

/// Virtual filesystem runtime.
///
/// ```rust,ignore
/// use haste_core::runtime::test_utils::TestRuntime;
///
/// let runtime = TestRuntime::new().with_file("a/b.js", "var x;", 10);
/// let bytes = runtime.read_file(Path::new("a/b.js")).await.unwrap();
/// assert_eq!(bytes, b"var x;");
/// ```
#[derive(Debug, Default)]
pub struct TestRuntime {
    files: Mutex<FxHashMap<PathBuf, Entry>>,
    reads: AtomicUsize,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>, mtime: u64) -> Self {
        self.insert(path, content, mtime);
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>, mtime: u64) {
        self.files.lock().insert(
            path.into(),
            Entry {
                content: content.as_ref().to_vec(),
                mtime,
            },
        );
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files.lock().remove(path.as_ref());
    }

    /// All files currently stored, as `(path, mtime)` pairs sorted by path.
    pub fn listing(&self) -> Vec<(String, u64)> {
        let mut out: Vec<(String, u64)> = self
            .files
            .lock()
            .iter()
            .map(|(path, entry)| (path.to_string_lossy().into_owned(), entry.mtime))
            .collect();
        out.sort();
        out
    }

    /// Number of `read_file` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runtime for TestRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .get(path)
            .map(|entry| entry.content.clone())
            .ok_or_else(|| RuntimeError::FileNotFound(path.to_path_buf()))
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let mut files = self.files.lock();
        let mtime = files.get(path).map(|e| e.mtime + 1).unwrap_or(0);
        files.insert(
            path.to_path_buf(),
            Entry {
                content: content.to_vec(),
                mtime,
            },
        );
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    async fn create_dir(&self, _path: &Path, _recursive: bool) -> RuntimeResult<()> {
        Ok(())
    }
}
