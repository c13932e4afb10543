//! Bounded-concurrency load scheduler.
//!
//! Jobs are dispatched in order. A job whose path no loader claims is
//! skipped without taking a permit. Every other job holds one semaphore
//! permit for the whole of its load, so at most `max_open_files` loads are
//! ever outstanding. The permit lives inside the spawned task and is
//! released when the task ends, including when the loader panics.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use haste_core::{ConfigurationTrie, MessageList, Resource, ResourceTypes};

use crate::error::UpdateError;

/// One file to analyze.
#[derive(Debug, Clone)]
pub(crate) struct Job {
    pub path: String,
    /// Present for modifications; routes the load through `update_from_path`.
    pub old: Option<Arc<Resource>>,
}

/// Outcome of one scheduler run.
#[derive(Debug, Default)]
pub(crate) struct Analysis {
    /// Index-aligned with the submitted jobs.
    pub loaded: Vec<Option<Resource>>,
    pub messages: MessageList,
    pub skipped: Vec<String>,
}

pub(crate) async fn analyze(
    types: &ResourceTypes,
    trie: &ConfigurationTrie,
    jobs: &[Job],
    max_open_files: usize,
) -> Result<Analysis, UpdateError> {
    let mut analysis = Analysis {
        loaded: vec![None; jobs.len()],
        ..Default::default()
    };

    let semaphore = Arc::new(Semaphore::new(max_open_files.max(1)));
    let mut join_set = JoinSet::new();

    for (index, job) in jobs.iter().enumerate() {
        let Some(loader) = types.loader_for_path(&job.path) else {
            analysis.skipped.push(job.path.clone());
            continue;
        };

        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|err| UpdateError::Scheduler(err.to_string()))?;

        let loader = Arc::clone(loader);
        let configuration = trie.find_configuration(&job.path).cloned();
        let path = job.path.clone();
        let old = job.old.clone();
        tracing::trace!(path = %path, loader = loader.name(), "load scheduled");

        join_set.spawn(async move {
            let _permit = permit;
            let load = async {
                match &old {
                    Some(old) => {
                        loader
                            .update_from_path(&path, configuration.as_ref(), old)
                            .await
                    }
                    None => loader.load_from_path(&path, configuration.as_ref()).await,
                }
            };
            let outcome = AssertUnwindSafe(load).catch_unwind().await;
            (index, path, outcome)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        let (index, path, outcome) =
            joined.map_err(|err| UpdateError::Scheduler(err.to_string()))?;
        match outcome {
            Ok(result) => {
                analysis.messages.merge(result.messages);
                analysis.loaded[index] = result.resource;
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::warn!(path = %path, reason = %reason, "loader panicked");
                analysis
                    .messages
                    .add_clowntown(&path, "panic", format!("Loader panicked: {reason}"));
            }
        }
    }

    Ok(analysis)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
