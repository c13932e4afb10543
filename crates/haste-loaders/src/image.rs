//! Image loader.
//!
//! Loading an image is free: the resource is just its path. Dimensions are
//! filled in by the post-process step, which reads file headers for the
//! whole batch with bounded concurrency.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use haste_core::{
    ConfigurationHandle, ImageInfo, LoadResult, Loader, MessageList, PostProcessResult, Resource,
    ResourceKind, ResourceMap, ResourceType, Runtime,
};

use crate::parse::image_size;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLoaderOptions {
    /// Header reads in flight during post-processing.
    pub max_concurrency: usize,
}

impl Default for ImageLoaderOptions {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

#[derive(Debug, Clone)]
pub struct ImageLoader {
    runtime: Arc<dyn Runtime>,
    options: ImageLoaderOptions,
}

const EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];

impl ImageLoader {
    pub fn new(runtime: Arc<dyn Runtime>, options: ImageLoaderOptions) -> Self {
        Self { runtime, options }
    }
}

async fn measure(runtime: Arc<dyn Runtime>, resource: Arc<Resource>) -> Result<Resource, String> {
    let bytes = runtime
        .read_file(Path::new(&resource.path))
        .await
        .map_err(|err| err.to_string())?;
    let size = image_size(&bytes).ok_or_else(|| "Unrecognized image header".to_string())?;

    let mut measured = (*resource).clone();
    measured.kind = ResourceKind::Image(ImageInfo {
        width: size.width,
        height: size.height,
    });
    Ok(measured)
}

#[async_trait]
impl Loader for ImageLoader {
    fn name(&self) -> &str {
        "image"
    }

    fn resource_types(&self) -> &[ResourceType] {
        &[ResourceType::Image]
    }

    fn version(&self) -> &str {
        "0.1"
    }

    fn extensions(&self) -> &[&str] {
        EXTENSIONS
    }

    fn match_path(&self, path: &str) -> bool {
        EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }

    async fn load_from_path(
        &self,
        path: &str,
        _configuration: Option<&ConfigurationHandle>,
    ) -> LoadResult {
        let resource = Resource::new(path, ResourceKind::Image(ImageInfo::default())).with_id(path);
        LoadResult::loaded(resource, MessageList::new())
    }

    async fn post_process(&self, _map: &ResourceMap, resources: &[Arc<Resource>]) -> PostProcessResult {
        let pending: Vec<Arc<Resource>> = resources
            .iter()
            .filter(|r| r.as_image().is_some_and(|info| !info.is_measured()))
            .cloned()
            .collect();

        let runtime = Arc::clone(&self.runtime);
        let outcomes: Vec<(String, Result<Resource, String>)> = stream::iter(pending)
            .map(move |resource| {
                let runtime = Arc::clone(&runtime);
                async move { (resource.path.clone(), measure(runtime, resource).await) }
            })
            .buffer_unordered(self.options.max_concurrency.max(1))
            .collect()
            .await;

        let mut result = PostProcessResult::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(measured) => result.updated.push(measured),
                Err(reason) => result.messages.add_warning(&path, "image-size", reason),
            }
        }
        result
    }
}
