//! Sharded analysis.
//!
//! Splits a load over independent shards. Each shard gets a self-contained
//! JSON request (scheduler budget, the configurations it needs, its paths
//! and their previous resources), runs its own scheduler on a separate task,
//! and answers with a JSON response. Nothing is shared between shards except the loader registry,
//! so the merged result does not depend on the shard count.
//!
//! ```text
//!   paths ──┬── i % n == 0 ──▶ shard 0 ──┐
//!           ├── i % n == 1 ──▶ shard 1 ──┼──▶ merge in shard order
//!           └── ...                ...  ─┘
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

use haste_core::{ConfigurationHandle, ConfigurationTrie, MessageList, Resource, ResourceTypes};

use crate::scheduler::{self, Job};

/// Scheduler settings carried by a shard request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardTask {
    pub max_open_files: usize,
    pub configurations: Vec<Resource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardRequest {
    pub task: ShardTask,
    pub paths: Vec<String>,
    /// Cached resources for modified paths; those are reloaded with
    /// `update_from_path`.
    #[serde(default)]
    pub old_resources: Vec<Resource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardResponse {
    pub resources: Vec<Resource>,
    pub messages: MessageList,
    pub skipped: Vec<String>,
}

impl ShardResponse {
    fn merge(&mut self, other: ShardResponse) {
        self.resources.extend(other.resources);
        self.messages.merge(other.messages);
        self.skipped.extend(other.skipped);
    }

    fn failed(paths: &[String], reason: &str) -> Self {
        let mut response = Self::default();
        for path in paths {
            response.messages.add_clowntown(path, "shard", reason);
        }
        response
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardOptions {
    pub max_shards: usize,
    /// How long the whole fan-out may take before unanswered shards are
    /// reported as failed.
    pub timeout: Duration,
}

impl Default for ShardOptions {
    fn default() -> Self {
        Self {
            max_shards: 4,
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShardedAnalyzer {
    types: ResourceTypes,
    max_open_files: usize,
    options: ShardOptions,
}

impl ShardedAnalyzer {
    pub fn new(types: ResourceTypes, max_open_files: usize, options: ShardOptions) -> Self {
        Self {
            types,
            max_open_files: max_open_files.max(1),
            options,
        }
    }

    /// Shards worth starting for `paths` files: one per full budget of
    /// open files, capped at `max_shards`.
    pub fn shard_count(&self, paths: usize) -> usize {
        (paths / self.max_open_files)
            .min(self.options.max_shards)
            .max(1)
    }

    /// Load `paths` with the shard count picked by [`Self::shard_count`].
    ///
    /// `old_resources` holds the current resource of every modified path.
    pub async fn run_optimally(
        &self,
        paths: Vec<String>,
        old_resources: &[Arc<Resource>],
        configurations: &[ConfigurationHandle],
    ) -> ShardResponse {
        let shards = self.shard_count(paths.len());
        if shards <= 1 {
            let old = old_by_path(old_resources);
            let request = self.request(paths, &old, configurations, self.max_open_files);
            return serve_request(&self.types, request)
                .await
                .unwrap_or_else(|(paths, reason)| ShardResponse::failed(&paths, &reason));
        }
        self.run(paths, old_resources, configurations, shards).await
    }

    /// Load `paths` across exactly `shards` shards. The open-file budget is
    /// divided between them.
    pub async fn run(
        &self,
        paths: Vec<String>,
        old_resources: &[Arc<Resource>],
        configurations: &[ConfigurationHandle],
        shards: usize,
    ) -> ShardResponse {
        let shards = shards.max(1);
        let budget = (self.max_open_files / shards).max(1);
        let old = old_by_path(old_resources);

        let mut partitions: Vec<Vec<String>> = vec![Vec::new(); shards];
        for (i, path) in paths.into_iter().enumerate() {
            partitions[i % shards].push(path);
        }

        let deadline = Instant::now() + self.options.timeout;
        let mut pending = Vec::with_capacity(shards);
        for partition in partitions {
            let request = self.request(partition.clone(), &old, configurations, budget);
            let handle = match serde_json::to_string(&request) {
                Ok(encoded) => Some(tokio::spawn(serve(self.types.clone(), encoded))),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to encode shard request");
                    None
                }
            };
            pending.push((partition, handle));
        }
        tracing::debug!(shards, budget, "shards started");

        let mut merged = ShardResponse::default();
        for (index, (partition, handle)) in pending.into_iter().enumerate() {
            let Some(mut handle) = handle else {
                merged.merge(ShardResponse::failed(&partition, "Shard request could not be encoded"));
                continue;
            };

            let response = match timeout_at(deadline, &mut handle).await {
                Err(_) => {
                    handle.abort();
                    tracing::warn!(shard = index, "shard timed out");
                    Err("Shard timed out".to_string())
                }
                Ok(Err(join_err)) => {
                    tracing::warn!(shard = index, error = %join_err, "shard panicked");
                    Err(format!("Shard failed: {join_err}"))
                }
                Ok(Ok(Err(reason))) => Err(reason),
                Ok(Ok(Ok(encoded))) => serde_json::from_str::<ShardResponse>(&encoded)
                    .map_err(|err| format!("Malformed shard response: {err}")),
            };

            match response {
                Ok(response) => merged.merge(response),
                Err(reason) => merged.merge(ShardResponse::failed(&partition, &reason)),
            }
        }
        merged
    }

    fn request(
        &self,
        paths: Vec<String>,
        old: &FxHashMap<&str, &Arc<Resource>>,
        configurations: &[ConfigurationHandle],
        max_open_files: usize,
    ) -> ShardRequest {
        let old_resources = paths
            .iter()
            .filter_map(|path| old.get(path.as_str()))
            .map(|resource| Resource::clone(resource))
            .collect();
        ShardRequest {
            task: ShardTask {
                max_open_files,
                configurations: configurations
                    .iter()
                    .map(|config| config.resource().as_ref().clone())
                    .collect(),
            },
            paths,
            old_resources,
        }
    }
}

fn old_by_path(resources: &[Arc<Resource>]) -> FxHashMap<&str, &Arc<Resource>> {
    resources
        .iter()
        .map(|resource| (resource.path.as_str(), resource))
        .collect()
}

/// Shard entry point: JSON request in, JSON response out.
async fn serve(types: ResourceTypes, encoded: String) -> Result<String, String> {
    let request: ShardRequest =
        serde_json::from_str(&encoded).map_err(|err| format!("Malformed shard request: {err}"))?;
    let response = serve_request(&types, request)
        .await
        .map_err(|(_, reason)| reason)?;
    serde_json::to_string(&response).map_err(|err| format!("Failed to encode shard response: {err}"))
}

async fn serve_request(
    types: &ResourceTypes,
    request: ShardRequest,
) -> Result<ShardResponse, (Vec<String>, String)> {
    let trie = ConfigurationTrie::new(
        request
            .task
            .configurations
            .into_iter()
            .filter_map(|resource| ConfigurationHandle::new(Arc::new(resource))),
    );
    let mut old: FxHashMap<String, Arc<Resource>> = request
        .old_resources
        .into_iter()
        .map(|resource| (resource.path.clone(), Arc::new(resource)))
        .collect();
    let jobs: Vec<Job> = request
        .paths
        .iter()
        .map(|path| Job {
            path: path.clone(),
            old: old.remove(path),
        })
        .collect();

    let analysis = scheduler::analyze(types, &trie, &jobs, request.task.max_open_files)
        .await
        .map_err(|err| (request.paths.clone(), err.to_string()))?;

    Ok(ShardResponse {
        resources: analysis.loaded.into_iter().flatten().collect(),
        messages: analysis.messages,
        skipped: analysis.skipped,
    })
}
