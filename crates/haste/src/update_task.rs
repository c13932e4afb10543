//! Incremental resource map update.
//!
//! A [`MapUpdateTask`] runs five phases, strictly in sequence:
//!
//! 1. **Discover**: one call to the [`FileFinder`].
//! 2. **Diff**: compare the listing with the map by path and mtime.
//! 3. **Configurations**: load changed `package.json` files first (within the
//!    same `max_open_files` budget), then mark every discovered file under an
//!    affected haste directory as changed.
//! 4. **Analyze**: run loaders over the changed paths with at most
//!    `max_open_files` loads in flight.
//! 5. **Fold**: apply every change to the map, then post-process each
//!    loader's fresh resources against the updated map.
//!
//! A cycle with nothing to do still goes through all five phases.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use haste_core::{
    ConfigurationHandle, ConfigurationTrie, MessageList, ProjectConfiguration, Resource,
    ResourceMap, ResourceTypes,
};

use crate::analyze::{ShardOptions, ShardedAnalyzer};
use crate::error::UpdateError;
use crate::finder::FileFinder;
use crate::scheduler::{self, Job};

/// One path's before/after state within a cycle.
///
/// `old_resource == None` is an addition, `new_path == None` a deletion,
/// both present a modification.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub path: String,
    pub mtime: u64,
    pub old_resource: Option<Arc<Resource>>,
    pub new_path: Option<String>,
    pub new_resource: Option<Arc<Resource>>,
    /// Loaded ahead of phase 4.
    resolved: bool,
}

impl ChangeRecord {
    fn new(path: String, mtime: u64, old_resource: Option<Arc<Resource>>, present: bool) -> Self {
        Self {
            new_path: present.then(|| path.clone()),
            path,
            mtime,
            old_resource,
            new_resource: None,
            resolved: false,
        }
    }

    pub fn is_addition(&self) -> bool {
        self.old_resource.is_none()
    }

    pub fn is_deletion(&self) -> bool {
        self.new_path.is_none()
    }

    pub fn is_modification(&self) -> bool {
        self.old_resource.is_some() && self.new_path.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Discover,
    Diff,
    Configurations,
    Analyze,
    Fold,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Discover => "discover",
            Phase::Diff => "diff",
            Phase::Configurations => "configurations",
            Phase::Analyze => "analyze",
            Phase::Fold => "fold",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Loads allowed in flight at once.
    pub max_open_files: usize,
    /// Fan phase 4 out over shards when there is enough work.
    pub shards: Option<ShardOptions>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            max_open_files: 200,
            shards: None,
        }
    }
}

/// Result of one cycle.
#[derive(Debug, Default)]
pub struct UpdateOutcome {
    pub messages: MessageList,
    /// Changed paths no loader claimed.
    pub skipped: Vec<String>,
    pub changes: Vec<ChangeRecord>,
}

type PhaseObserver = Arc<dyn Fn(Phase, &[ChangeRecord]) + Send + Sync>;

/// One incremental update of a [`ResourceMap`].
///
/// Only one task may run against a given map at a time; `run` takes the map
/// by `&mut` for that reason.
#[derive(Clone)]
pub struct MapUpdateTask {
    finder: Arc<dyn FileFinder>,
    types: ResourceTypes,
    options: UpdateOptions,
    observer: Option<PhaseObserver>,
}

impl fmt::Debug for MapUpdateTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapUpdateTask")
            .field("finder", &self.finder)
            .field("types", &self.types)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// State carried between phases.
#[derive(Default)]
struct Cycle {
    files: Vec<(String, u64)>,
    changes: Vec<ChangeRecord>,
    by_path: FxHashMap<String, usize>,
    messages: MessageList,
    skipped: Vec<String>,
    /// Loader position to the records it produced in phase 4.
    produced: BTreeMap<usize, Vec<usize>>,
}

impl Cycle {
    /// First record for a path wins.
    fn mark(&mut self, record: ChangeRecord) {
        if self.by_path.contains_key(&record.path) {
            return;
        }
        self.by_path.insert(record.path.clone(), self.changes.len());
        self.changes.push(record);
    }
}

impl MapUpdateTask {
    pub fn new(finder: Arc<dyn FileFinder>, types: ResourceTypes, options: UpdateOptions) -> Self {
        Self {
            finder,
            types,
            options,
            observer: None,
        }
    }

    /// Call `observer` after each phase with the change records so far.
    pub fn on_phase(
        mut self,
        observer: impl Fn(Phase, &[ChangeRecord]) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn types(&self) -> &ResourceTypes {
        &self.types
    }

    /// Run all five phases against `map`.
    ///
    /// Per-file failures are reported in the outcome's messages. An error is
    /// returned only when the listing itself cannot be produced or the
    /// scheduler breaks down; `map` is untouched in that case.
    pub async fn run(&self, map: &mut ResourceMap) -> Result<UpdateOutcome, UpdateError> {
        let mut cycle = Cycle {
            files: self.finder.find().await?,
            ..Default::default()
        };
        tracing::debug!(phase = %Phase::Discover, files = cycle.files.len(), "phase complete");
        self.notify(Phase::Discover, &cycle);

        self.mark_changed_files(map, &mut cycle);
        tracing::debug!(phase = %Phase::Diff, changed = cycle.changes.len(), "phase complete");
        self.notify(Phase::Diff, &cycle);

        self.process_changed_configurations(map, &mut cycle).await?;
        tracing::debug!(
            phase = %Phase::Configurations,
            changed = cycle.changes.len(),
            "phase complete"
        );
        self.notify(Phase::Configurations, &cycle);

        self.analyze_changed(map, &mut cycle).await?;
        tracing::debug!(
            phase = %Phase::Analyze,
            skipped = cycle.skipped.len(),
            messages = cycle.messages.len(),
            "phase complete"
        );
        self.notify(Phase::Analyze, &cycle);

        self.fold(map, &mut cycle).await;
        tracing::debug!(phase = %Phase::Fold, resources = map.len(), "phase complete");
        self.notify(Phase::Fold, &cycle);

        Ok(UpdateOutcome {
            messages: cycle.messages,
            skipped: cycle.skipped,
            changes: cycle.changes,
        })
    }

    fn notify(&self, phase: Phase, cycle: &Cycle) {
        if let Some(observer) = &self.observer {
            observer(phase, &cycle.changes);
        }
    }

    fn is_configuration_path(&self, path: &str) -> bool {
        match self.types.configuration_loader() {
            Some(loader) => loader.match_path(path),
            None => ProjectConfiguration::matches_path(path),
        }
    }

    /// Phase 2.
    fn mark_changed_files(&self, map: &ResourceMap, cycle: &mut Cycle) {
        let mut visited: FxHashSet<String> = FxHashSet::default();
        let files = std::mem::take(&mut cycle.files);

        for (path, mtime) in &files {
            if !visited.insert(path.clone()) {
                continue;
            }
            match map.get_by_path(path) {
                None => cycle.mark(ChangeRecord::new(path.clone(), *mtime, None, true)),
                Some(resource) if resource.mtime < *mtime => cycle.mark(ChangeRecord::new(
                    path.clone(),
                    *mtime,
                    Some(Arc::clone(resource)),
                    true,
                )),
                Some(_) => {}
            }
        }

        for resource in map.get_all() {
            if !visited.contains(&resource.path) {
                cycle.mark(ChangeRecord::new(
                    resource.path.clone(),
                    resource.mtime,
                    Some(Arc::clone(resource)),
                    false,
                ));
            }
        }

        cycle.files = files;
    }

    /// Phase 3.
    async fn process_changed_configurations(
        &self,
        map: &ResourceMap,
        cycle: &mut Cycle,
    ) -> Result<(), UpdateError> {
        let mut affected: Vec<String> = Vec::new();
        let mut to_load: Vec<usize> = Vec::new();

        for (index, record) in cycle.changes.iter().enumerate() {
            if !self.is_configuration_path(&record.path) {
                continue;
            }
            if let Some(old) = record
                .old_resource
                .as_ref()
                .and_then(|old| ConfigurationHandle::new(Arc::clone(old)))
            {
                affected.extend(old.haste_directories());
            }
            if record.new_path.is_some() {
                to_load.push(index);
            }
        }

        if let Some(loader) = self.types.configuration_loader() {
            let loads = to_load.iter().map(|&index| {
                let path = cycle.changes[index].path.clone();
                async move { (index, loader.load_from_path(&path, None).await) }
            });
            // Same open-file budget as phase 4; `buffered` keeps listing order.
            let results: Vec<_> = stream::iter(loads)
                .buffered(self.options.max_open_files.max(1))
                .collect()
                .await;
            for (index, result) in results {
                let record = &mut cycle.changes[index];
                cycle.messages.merge(result.messages);
                record.resolved = true;
                record.new_resource = result.resource.map(|resource| {
                    let resource = Arc::new(resource.with_mtime(record.mtime));
                    if let Some(config) = ConfigurationHandle::new(Arc::clone(&resource)) {
                        affected.extend(config.haste_directories());
                    }
                    resource
                });
            }
        }

        let Some(pattern) = affected_pattern(&affected)? else {
            return Ok(());
        };
        let files = std::mem::take(&mut cycle.files);
        for (path, mtime) in &files {
            if pattern.is_match(path) {
                let old = map.get_by_path(path).cloned();
                cycle.mark(ChangeRecord::new(path.clone(), *mtime, old, true));
            }
        }
        cycle.files = files;
        Ok(())
    }

    /// Configurations valid for this cycle, fresh loads first.
    fn current_configurations(&self, map: &ResourceMap, cycle: &Cycle) -> Vec<ConfigurationHandle> {
        cycle
            .files
            .iter()
            .filter(|(path, _)| self.is_configuration_path(path))
            .filter_map(|(path, _)| {
                let fresh = cycle
                    .by_path
                    .get(path)
                    .map(|&index| &cycle.changes[index])
                    .filter(|record| record.resolved)
                    .map(|record| record.new_resource.clone());
                match fresh {
                    Some(resource) => resource,
                    None => map.get_by_path(path).cloned(),
                }
            })
            .filter_map(ConfigurationHandle::new)
            .collect()
    }

    /// Phase 4.
    async fn analyze_changed(&self, map: &ResourceMap, cycle: &mut Cycle) -> Result<(), UpdateError> {
        let pending: Vec<usize> = cycle
            .changes
            .iter()
            .enumerate()
            .filter(|(_, record)| record.new_path.is_some() && !record.resolved)
            .map(|(index, _)| index)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let configurations = self.current_configurations(map, cycle);
        let sharded = self.options.shards.map(|options| {
            ShardedAnalyzer::new(self.types.clone(), self.options.max_open_files, options)
        });

        let loaded: Vec<(usize, Resource)> = match sharded {
            Some(analyzer) if analyzer.shard_count(pending.len()) > 1 => {
                let paths = pending.iter().map(|&i| cycle.changes[i].path.clone()).collect();
                let old: Vec<Arc<Resource>> = pending
                    .iter()
                    .filter_map(|&i| cycle.changes[i].old_resource.clone())
                    .collect();
                let response = analyzer.run_optimally(paths, &old, &configurations).await;
                cycle.messages.merge(response.messages);
                cycle.skipped.extend(response.skipped);
                response
                    .resources
                    .into_iter()
                    .filter_map(|resource| {
                        let index = *cycle.by_path.get(&resource.path)?;
                        Some((index, resource))
                    })
                    .collect()
            }
            _ => {
                let trie = ConfigurationTrie::new(configurations);
                let jobs: Vec<Job> = pending
                    .iter()
                    .map(|&i| Job {
                        path: cycle.changes[i].path.clone(),
                        old: cycle.changes[i].old_resource.clone(),
                    })
                    .collect();
                let analysis =
                    scheduler::analyze(&self.types, &trie, &jobs, self.options.max_open_files)
                        .await?;
                cycle.messages.merge(analysis.messages);
                cycle.skipped.extend(analysis.skipped);
                pending
                    .iter()
                    .zip(analysis.loaded)
                    .filter_map(|(&index, resource)| Some((index, resource?)))
                    .collect()
            }
        };

        for (index, resource) in loaded {
            let record = &mut cycle.changes[index];
            record.new_resource = Some(Arc::new(resource.with_mtime(record.mtime)));
            if let Some(position) = self.types.position_for_path(&record.path) {
                cycle.produced.entry(position).or_default().push(index);
            }
        }
        Ok(())
    }

    /// Phase 5.
    async fn fold(&self, map: &mut ResourceMap, cycle: &mut Cycle) {
        let skipped: FxHashSet<&str> = cycle.skipped.iter().map(String::as_str).collect();
        for record in &cycle.changes {
            match (&record.old_resource, &record.new_resource) {
                (Some(old), _) if record.new_path.is_none() => {
                    map.remove(old);
                }
                (Some(old), Some(new)) => map.update(old, Arc::clone(new)),
                (None, Some(new)) => map.add(Arc::clone(new)),
                // no loader claims the path; leave what is there
                (Some(_), None) if skipped.contains(record.path.as_str()) => {}
                (Some(old), None) => {
                    tracing::debug!(path = %record.path, "no resource produced, dropping");
                    map.remove(old);
                }
                (None, None) => {}
            }
        }

        if cycle.produced.is_empty() {
            return;
        }

        let loaders = self.types.loaders();
        let shared: &ResourceMap = map;
        let calls = cycle.produced.iter().map(|(&position, indices)| {
            let loader = &loaders[position];
            let resources: Vec<Arc<Resource>> = indices
                .iter()
                .filter_map(|&index| cycle.changes[index].new_resource.clone())
                .collect();
            async move { loader.post_process(shared, &resources).await }
        });
        let results = join_all(calls).await;

        for result in results {
            cycle.messages.merge(result.messages);
            for updated in result.updated {
                let Some(stored) = map.get_by_path(&updated.path).cloned() else {
                    continue;
                };
                let updated = Arc::new(updated);
                map.update(&stored, Arc::clone(&updated));
                if let Some(&index) = cycle.by_path.get(&updated.path) {
                    cycle.changes[index].new_resource = Some(updated);
                }
            }
        }
    }
}

/// `^(?:dir1/|dir2/|...)`. The root directory matches every path.
fn affected_pattern(directories: &[String]) -> Result<Option<Regex>, UpdateError> {
    if directories.is_empty() {
        return Ok(None);
    }
    let alternatives: Vec<String> = directories
        .iter()
        .map(|dir| {
            if dir.is_empty() {
                String::new()
            } else {
                format!("{}/", regex::escape(dir))
            }
        })
        .collect();
    let pattern = format!("^(?:{})", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|err| UpdateError::Scheduler(format!("invalid directory pattern: {err}")))
}
