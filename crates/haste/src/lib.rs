//! # haste
//!
//! Incremental module discovery. Crawls a project, classifies files with
//! pluggable loaders, resolves module ids through `package.json`
//! configurations, and keeps a cached [`ResourceMap`] up to date with the
//! least possible re-parsing.
//!
//! ```text
//!   cache.json ──▶ ResourceMapSerializer ──▶ ResourceMap ─┐
//!                                                         │
//!   FileFinder ──▶ MapUpdateTask ◀────────────────────────┘
//!                    │ 1 discover   (path, mtime) listing
//!                    │ 2 diff       additions / modifications / deletions
//!                    │ 3 configs    reload package.json, cascade to governed files
//!                    │ 4 analyze    loaders, <= max_open_files in flight
//!                    │ 5 fold       apply changes, post-process per loader
//!                    ▼
//!               ResourceMap ──▶ ResourceMapSerializer ──▶ cache.json
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use haste::{Haste, HasteConfig};
//! use std::path::Path;
//!
//! # async fn run() -> haste::Result<()> {
//! let root = Path::new("/path/to/project");
//! let config = HasteConfig::load(root)?;
//! let haste = Haste::from_config(root, &config)?;
//!
//! let update = haste.update(&config.cache_path).await?;
//! for message in update.outcome.messages.iter() {
//!     eprintln!("{message}");
//! }
//! println!("{} resources", update.map.len());
//! # Ok(())
//! # }
//! ```
//!
//! Library code only emits `tracing` events. Enable the `logging` feature
//! for `logging::init_logging`.

pub mod analyze;
pub mod config;
pub mod error;
mod facade;
pub mod finder;
#[cfg(feature = "logging")]
pub mod logging;
mod scheduler;
pub mod update_task;

pub use analyze::{ShardOptions, ShardRequest, ShardResponse, ShardTask, ShardedAnalyzer};
pub use config::HasteConfig;
pub use error::{ConfigError, HasteError, Result, UpdateError};
pub use facade::{Haste, HasteOptions, HasteUpdate};
pub use finder::{FileFinder, WalkFinder};
pub use update_task::{ChangeRecord, MapUpdateTask, Phase, UpdateOptions, UpdateOutcome};

pub use haste_core::{
    ConfigurationHandle, LoadResult, Loader, Message, MessageList, PostProcessResult, Resource,
    ResourceKind, ResourceMap, ResourceType, ResourceTypes, Severity,
};
