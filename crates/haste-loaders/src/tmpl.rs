//! Template loader: `*.tmpl` files parsed as scripts.

use async_trait::async_trait;
use std::sync::Arc;

use haste_core::{
    ConfigurationHandle, LoadResult, Loader, PostProcessResult, Resource, ResourceMap,
    ResourceType, Runtime,
};

use crate::js::{JsLoader, JsLoaderOptions};
use crate::read_source;

#[derive(Debug, Clone)]
pub struct TmplLoader {
    runtime: Arc<dyn Runtime>,
    js: JsLoader,
}

impl TmplLoader {
    pub fn new(runtime: Arc<dyn Runtime>, options: JsLoaderOptions) -> Self {
        Self {
            js: JsLoader::new(Arc::clone(&runtime), options),
            runtime,
        }
    }
}

#[async_trait]
impl Loader for TmplLoader {
    fn name(&self) -> &str {
        "tmpl"
    }

    fn resource_types(&self) -> &[ResourceType] {
        &[ResourceType::Js]
    }

    fn extensions(&self) -> &[&str] {
        &[".tmpl"]
    }

    fn match_path(&self, path: &str) -> bool {
        path.ends_with(".tmpl")
    }

    async fn load_from_path(
        &self,
        path: &str,
        configuration: Option<&ConfigurationHandle>,
    ) -> LoadResult {
        match read_source(self.runtime.as_ref(), path).await {
            Ok(source) => self.js.load_from_source(path, configuration, &source),
            Err(failed) => failed,
        }
    }

    async fn post_process(&self, map: &ResourceMap, resources: &[Arc<Resource>]) -> PostProcessResult {
        self.js.post_process(map, resources).await
    }
}
