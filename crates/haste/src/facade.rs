//! The `Haste` facade: cache in, update, cache out.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use haste_core::{
    Loader, NativeRuntime, ResourceMap, ResourceMapSerializer, ResourceTypes, Runtime,
};
use haste_loaders::default_loaders;

use crate::config::HasteConfig;
use crate::error::Result;
use crate::finder::{FileFinder, WalkFinder};
use crate::update_task::{MapUpdateTask, UpdateOptions, UpdateOutcome};

#[derive(Debug, Clone, Default)]
pub struct HasteOptions {
    /// Project root. Scan directories resolve against it, and so do
    /// relative cache paths on the default runtime.
    pub root: PathBuf,
    pub update: UpdateOptions,
    pub cache_version: Option<String>,
    pub ignore: Vec<Regex>,
}

/// Result of [`Haste::update`].
#[derive(Debug)]
pub struct HasteUpdate {
    pub map: ResourceMap,
    pub outcome: UpdateOutcome,
    /// Whether the map was written back to the cache.
    pub stored: bool,
}

#[derive(Debug, Clone)]
pub struct Haste {
    types: ResourceTypes,
    scan_dirs: Vec<String>,
    options: HasteOptions,
    runtime: Arc<dyn Runtime>,
    finder: Option<Arc<dyn FileFinder>>,
}

impl Haste {
    /// `loaders` read through their own runtime. Listed paths are relative
    /// to `options.root`, so a native runtime handed to them should be
    /// [`NativeRuntime::with_root`].
    pub fn new(loaders: Vec<Arc<dyn Loader>>, scan_dirs: Vec<String>, options: HasteOptions) -> Self {
        let runtime = Arc::new(NativeRuntime::with_root(options.root.clone()));
        Self {
            types: ResourceTypes::new(loaders),
            scan_dirs,
            options,
            runtime,
            finder: None,
        }
    }

    /// The default loader set on a native runtime rooted at `root`,
    /// configured from `config`.
    pub fn from_config(root: impl Into<PathBuf>, config: &HasteConfig) -> Result<Self> {
        config.validate()?;
        let root = root.into();
        let runtime: Arc<dyn Runtime> = Arc::new(NativeRuntime::with_root(root.clone()));
        let loaders = default_loaders(Arc::clone(&runtime), &config.loader_options());
        let options = HasteOptions {
            root,
            update: config.update_options(),
            cache_version: config.cache_version.clone(),
            ignore: config.ignore_regexes()?,
        };
        Ok(Self::new(loaders, config.scan_dirs.clone(), options).with_runtime(runtime))
    }

    /// Runtime used for cache I/O. Relative cache paths are handed to it
    /// unchanged.
    pub fn with_runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Replace the directory walk with another listing source.
    pub fn with_finder(mut self, finder: Arc<dyn FileFinder>) -> Self {
        self.finder = Some(finder);
        self
    }

    pub fn types(&self) -> &ResourceTypes {
        &self.types
    }

    /// A walk over the scan directories, limited to the loaders'
    /// extensions and filtered by the ignore patterns.
    pub fn finder(&self) -> WalkFinder {
        self.options.ignore.iter().cloned().fold(
            WalkFinder::new(&self.options.root, self.scan_dirs.clone())
                .with_extensions(self.types.extensions()),
            WalkFinder::ignore_pattern,
        )
    }

    pub fn serializer(&self) -> ResourceMapSerializer {
        let serializer = ResourceMapSerializer::new(&self.types);
        match &self.options.cache_version {
            Some(version) => serializer.with_cache_version(version),
            None => serializer,
        }
    }

    /// The cached map, or an empty one when there is no usable cache.
    pub async fn load_or_create_map(&self, path: &Path) -> ResourceMap {
        match self
            .serializer()
            .load_from_path(self.runtime.as_ref(), path)
            .await
        {
            Some(map) => {
                tracing::info!(path = %path.display(), resources = map.len(), "loaded cached map");
                map
            }
            None => {
                tracing::info!(path = %path.display(), "starting from an empty map");
                ResourceMap::new()
            }
        }
    }

    pub async fn store_map(&self, path: &Path, map: &ResourceMap) -> Result<()> {
        self.serializer()
            .store_to_path(self.runtime.as_ref(), path, map)
            .await?;
        tracing::info!(path = %path.display(), resources = map.len(), "stored map");
        Ok(())
    }

    /// Run one update cycle over `map` without touching the cache.
    pub async fn update_map(&self, map: &mut ResourceMap) -> Result<UpdateOutcome> {
        let finder: Arc<dyn FileFinder> = match &self.finder {
            Some(finder) => Arc::clone(finder),
            None => Arc::new(self.finder()),
        };
        let task = MapUpdateTask::new(finder, self.types.clone(), self.options.update);
        Ok(task.run(map).await?)
    }

    /// Load the cache, update, and write the map back if anything besides
    /// skipped paths changed.
    pub async fn update(&self, cache_path: &Path) -> Result<HasteUpdate> {
        let mut map = self.load_or_create_map(cache_path).await;
        let outcome = self.update_map(&mut map).await?;

        let stored = outcome.changes.len() > outcome.skipped.len();
        if stored {
            self.store_map(cache_path, &map).await?;
        }
        Ok(HasteUpdate {
            map,
            outcome,
            stored,
        })
    }
}
