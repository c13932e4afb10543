use async_trait::async_trait;

use haste_core::{ConfigurationHandle, LoadResult, Loader, MessageList, Resource, ResourceType};

/// Catch-all loader: every accepted path becomes a plain resource whose id
/// is its path. The file is not read.
#[derive(Debug, Clone, Default)]
pub struct ResourceLoader {
    extensions: Vec<&'static str>,
}

impl ResourceLoader {
    /// Accepts every path; contributes nothing to the crawler's filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts only paths with one of `extensions`.
    pub fn with_extensions(extensions: Vec<&'static str>) -> Self {
        Self { extensions }
    }
}

#[async_trait]
impl Loader for ResourceLoader {
    fn name(&self) -> &str {
        "resource"
    }

    fn resource_types(&self) -> &[ResourceType] {
        &[ResourceType::Resource]
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn match_path(&self, path: &str) -> bool {
        self.extensions.is_empty() || self.extensions.iter().any(|ext| path.ends_with(ext))
    }

    async fn load_from_path(
        &self,
        path: &str,
        _configuration: Option<&ConfigurationHandle>,
    ) -> LoadResult {
        LoadResult::loaded(Resource::generic(path), MessageList::new())
    }
}
