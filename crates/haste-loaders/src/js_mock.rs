use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

use haste_core::{
    ConfigurationHandle, LoadResult, Loader, MessageList, MockInfo, Resource, ResourceKind,
    ResourceType, Runtime,
};

use crate::parse::commonjs;
use crate::{read_source, special_dir_pattern};

/// Loads `__mocks__/*.js` files.
///
/// A mock takes the id of the module it stands in for: the configuration
/// resolves the path with the `__mocks__/` segment removed.
#[derive(Debug, Clone)]
pub struct JsMockLoader {
    runtime: Arc<dyn Runtime>,
    path_re: Regex,
}

impl JsMockLoader {
    pub fn new(runtime: Arc<dyn Runtime>, match_sub_dirs: bool) -> Self {
        Self {
            runtime,
            path_re: special_dir_pattern("__mocks__", match_sub_dirs),
        }
    }

    pub fn load_from_source(
        &self,
        path: &str,
        configuration: Option<&ConfigurationHandle>,
        source: &str,
    ) -> LoadResult {
        let id = configuration
            .and_then(|config| config.resolve_id(&path.replacen("__mocks__/", "", 1)))
            .or_else(|| self.path_re.captures(path).map(|caps| caps[1].to_string()));

        let info = MockInfo {
            required_modules: commonjs::extract_require_calls(source),
        };
        let mut resource = Resource::new(path, ResourceKind::JsMock(info));
        resource.id = id;
        LoadResult::loaded(resource, MessageList::new())
    }
}

#[async_trait]
impl Loader for JsMockLoader {
    fn name(&self) -> &str {
        "js-mock"
    }

    fn resource_types(&self) -> &[ResourceType] {
        &[ResourceType::JsMock]
    }

    fn extensions(&self) -> &[&str] {
        &[".js"]
    }

    fn match_path(&self, path: &str) -> bool {
        self.path_re.is_match(path)
    }

    async fn load_from_path(
        &self,
        path: &str,
        configuration: Option<&ConfigurationHandle>,
    ) -> LoadResult {
        match read_source(self.runtime.as_ref(), path).await {
            Ok(source) => self.load_from_source(path, configuration, &source),
            Err(failed) => failed,
        }
    }
}
