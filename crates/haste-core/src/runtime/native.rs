//! Native Runtime Implementation
//!
//! ```text
//! ┌─────────────────┐
//! │ NativeRuntime   │
//! │  .read_file()   │────▶ std::fs::read()
//! │  .write_file()  │────▶ std::fs::write()
//! │  .create_dir()  │────▶ std::fs::create_dir_all()
//! └─────────────────┘
//!          │   (root.join(path), spawn_blocking)
//!          ▼
//!   ┌──────────────┐
//!   │ OS Filesystem│
//!   └──────────────┘
//! ```

// The one place std::fs is allowed
#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::task;

use super::{Runtime, RuntimeError, RuntimeResult};

/// Native filesystem Runtime implementation using `std::fs`.
///
/// Blocking calls run on tokio's blocking pool so a large batch of loads
/// never stalls the scheduler driving them.
///
/// Resource paths are project-relative. With a root, relative paths are
/// joined onto it; without one they resolve against the working directory.
#[derive(Debug, Clone, Default)]
pub struct NativeRuntime {
    root: Option<PathBuf>,
}

impl NativeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime resolving relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn io_error(path: &Path, action: &str, err: std::io::Error) -> RuntimeError {
    if err.kind() == ErrorKind::NotFound {
        RuntimeError::FileNotFound(path.to_path_buf())
    } else {
        RuntimeError::Io(format!("Failed to {} {}: {}", action, path.display(), err))
    }
}

fn join_error(err: task::JoinError) -> RuntimeError {
    RuntimeError::Other(format!("Task join error: {}", err))
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = self.resolve(path);
        task::spawn_blocking(move || std::fs::read(&path).map_err(|e| io_error(&path, "read", e)))
            .await
            .map_err(join_error)?
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let path = self.resolve(path);
        let content = content.to_vec();
        task::spawn_blocking(move || {
            std::fs::write(&path, content).map_err(|e| io_error(&path, "write", e))
        })
        .await
        .map_err(join_error)?
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    async fn create_dir(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        let path = self.resolve(path);
        task::spawn_blocking(move || {
            let result = if recursive {
                std::fs::create_dir_all(&path)
            } else {
                std::fs::create_dir(&path)
            };
            result.map_err(|e| io_error(&path, "create", e))
        })
        .await
        .map_err(join_error)?
    }
}
