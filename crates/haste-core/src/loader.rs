//! Loader contract.
//!
//! A loader turns one file into one [`Resource`]. Loaders are registered in
//! priority order on [`ResourceTypes`](crate::ResourceTypes); the first
//! whose [`Loader::match_path`] accepts a path owns it.
//!
//! Every load reports through a returned [`LoadResult`] rather than an
//! error: unreadable files and parse failures are diagnostics, never reasons
//! to abort an update cycle.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::messages::MessageList;
use crate::resource::{ConfigurationHandle, Resource, ResourceType};
use crate::resource_map::ResourceMap;
use crate::runtime::RuntimeError;

/// Outcome of loading a single file.
#[derive(Debug, Default)]
pub struct LoadResult {
    pub messages: MessageList,
    /// `None` when the file could not be turned into a resource.
    pub resource: Option<Resource>,
}

impl LoadResult {
    pub fn loaded(resource: Resource, messages: MessageList) -> Self {
        Self {
            messages,
            resource: Some(resource),
        }
    }

    pub fn failed(messages: MessageList) -> Self {
        Self {
            messages,
            resource: None,
        }
    }

    /// A failed load caused by a runtime I/O error.
    pub fn io_error(path: &str, err: &RuntimeError) -> Self {
        let mut messages = MessageList::new();
        messages.add_error(path, "io", err.to_string());
        Self::failed(messages)
    }
}

/// Outcome of a loader's batch post-process step.
#[derive(Debug, Default)]
pub struct PostProcessResult {
    pub messages: MessageList,
    /// Replacements for resources the step enriched. Each replaces the
    /// stored resource at the same path.
    pub updated: Vec<Resource>,
}

/// Pluggable per-type file analyzer.
#[async_trait]
pub trait Loader: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Types of resource this loader produces.
    fn resource_types(&self) -> &[ResourceType];

    /// Declared version; part of the cache's type hash.
    fn version(&self) -> &str {
        "0.0"
    }

    /// File extensions (with the leading dot) the crawler should report.
    fn extensions(&self) -> &[&str];

    fn match_path(&self, path: &str) -> bool;

    /// Whether this loader produces project configurations.
    fn is_configuration_loader(&self) -> bool {
        self.resource_types().contains(&ResourceType::ProjectConfiguration)
    }

    async fn load_from_path(
        &self,
        path: &str,
        configuration: Option<&ConfigurationHandle>,
    ) -> LoadResult;

    /// Reload a file that already has a resource. Loaders that can detect a
    /// no-op cheaply may return a clone of `old`.
    async fn update_from_path(
        &self,
        path: &str,
        configuration: Option<&ConfigurationHandle>,
        _old: &Arc<Resource>,
    ) -> LoadResult {
        self.load_from_path(path, configuration).await
    }

    /// Batch step run once per cycle over this loader's fresh resources,
    /// after they have been folded into `map`.
    async fn post_process(
        &self,
        _map: &ResourceMap,
        _resources: &[Arc<Resource>],
    ) -> PostProcessResult {
        PostProcessResult::default()
    }
}
