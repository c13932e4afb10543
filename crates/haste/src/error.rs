//! Error types for the update pipeline and the facade.
//!
//! Per-file problems never show up here: they are diagnostics on the
//! aggregated [`MessageList`](haste_core::MessageList). These errors are for
//! conditions that stop a whole cycle, or stop one from starting.

use std::path::PathBuf;
use thiserror::Error;

use haste_core::{RuntimeError, SerializerError};

/// Failure of a whole update cycle.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The file finder could not produce a listing.
    #[error("File discovery failed: {0}")]
    Discovery(String),

    /// The scheduler lost track of in-flight work.
    #[error("Scheduler failure: {0}")]
    Scheduler(String),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Top-level error returned by the [`Haste`](crate::Haste) facade.
#[derive(Debug, Error)]
pub enum HasteError {
    #[error("Update error: {0}")]
    Update(#[from] UpdateError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Serializer(#[from] SerializerError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Scan directory not found: {}", .0.display())]
    MissingScanDir(PathBuf),
}

pub type Result<T> = std::result::Result<T, HasteError>;
