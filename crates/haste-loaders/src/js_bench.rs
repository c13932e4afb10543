use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

use haste_core::{
    BenchInfo, ConfigurationHandle, LoadResult, Loader, MessageList, Resource, ResourceKind,
    ResourceType, Runtime,
};

use crate::parse::{commonjs, docblock};
use crate::{contacts, read_source, special_dir_pattern};

/// Loads `__benchmarks__/*.js` files.
#[derive(Debug, Clone)]
pub struct JsBenchLoader {
    runtime: Arc<dyn Runtime>,
    path_re: Regex,
}

impl JsBenchLoader {
    pub fn new(runtime: Arc<dyn Runtime>, match_sub_dirs: bool) -> Self {
        Self {
            runtime,
            path_re: special_dir_pattern("__benchmarks__", match_sub_dirs),
        }
    }

    pub fn load_from_source(
        &self,
        path: &str,
        configuration: Option<&ConfigurationHandle>,
        source: &str,
    ) -> LoadResult {
        let mut info = BenchInfo::default();
        for (name, value) in docblock::parse(docblock::extract(source)) {
            if name == "emails" {
                info.contacts = contacts(&value);
            }
        }
        info.required_modules = commonjs::extract_require_calls(source);

        let mut resource = Resource::new(path, ResourceKind::JsBench(info));
        resource.id = configuration
            .and_then(|config| config.resolve_id(path))
            .or_else(|| self.path_re.captures(path).map(|caps| caps[1].to_string()));
        LoadResult::loaded(resource, MessageList::new())
    }
}

#[async_trait]
impl Loader for JsBenchLoader {
    fn name(&self) -> &str {
        "js-bench"
    }

    fn resource_types(&self) -> &[ResourceType] {
        &[ResourceType::JsBench]
    }

    fn version(&self) -> &str {
        "0.1"
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

#[cfg(test)]
mod tests {
    use super::*;
    use haste_core::runtime::test_utils::TestRuntime;

    #[tokio::test]
    async fn test_load_bench() {
        let runtime = Arc::new(TestRuntime::new().with_file(
            "a/__benchmarks__/sort.js",
            "/**\n * @emails perf@fb.com\n */\nvar sort = require('sort');",
            5,
        ));
        let loader = JsBenchLoader::new(runtime, false);
        assert_eq!(loader.version(), "0.1");

        let result = loader.load_from_path("a/__benchmarks__/sort.js", None).await;
        let resource = result.resource.unwrap();
        assert_eq!(resource.id(), Some("sort"));
        let ResourceKind::JsBench(info) = &resource.kind else {
            panic!("expected JSBench");
        };
        assert_eq!(info.contacts, vec!["perf@fb.com"]);
        assert_eq!(info.required_modules, vec!["sort"]);
    }
}
