use async_trait::async_trait;
use std::sync::Arc;

use haste_core::{
    ConfigurationHandle, LoadResult, Loader, MessageList, ProjectConfiguration, ResourceType,
    Runtime,
};

use crate::read_source;

/// Loads `package.json` manifests as project configurations.
#[derive(Debug, Clone)]
pub struct ProjectConfigurationLoader {
    runtime: Arc<dyn Runtime>,
}

impl ProjectConfigurationLoader {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }

    pub fn load_from_source(&self, path: &str, source: &str) -> LoadResult {
        match serde_json::from_str(source) {
            Ok(data) => {
                LoadResult::loaded(ProjectConfiguration::resource(path, data), MessageList::new())
            }
            Err(err) => {
                let mut messages = MessageList::new();
                messages.add_error(path, "json", format!("Invalid project configuration: {}", err));
                LoadResult::failed(messages)
            }
        }
    }
}

#[async_trait]
impl Loader for ProjectConfigurationLoader {
    fn name(&self) -> &str {
        "configuration"
    }

    fn resource_types(&self) -> &[ResourceType] {
        &[ResourceType::ProjectConfiguration]
    }

    fn extensions(&self) -> &[&str] {
        &[".json"]
    }

    fn match_path(&self, path: &str) -> bool {
        ProjectConfiguration::matches_path(path)
    }

    async fn load_from_path(
        &self,
        path: &str,
        _configuration: Option<&ConfigurationHandle>,
    ) -> LoadResult {
        match read_source(self.runtime.as_ref(), path).await {
            Ok(source) => self.load_from_source(path, &source),
            Err(failed) => failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haste_core::runtime::test_utils::TestRuntime;
    use haste_core::{ResourceKind, Severity};

    #[tokio::test]
    async fn test_loads_manifest() {
        let runtime = Arc::new(
            TestRuntime::new().with_file("p/package.json", r#"{"haste": {"roots": ["src"]}}"#, 3),
        );
        let loader = ProjectConfigurationLoader::new(runtime);
        assert!(loader.is_configuration_loader());

        let result = loader.load_from_path("p/package.json", None).await;
        let resource = result.resource.unwrap();
        assert_eq!(resource.id(), Some("p/package.json"));
        let ResourceKind::ProjectConfiguration(config) = &resource.kind else {
            panic!("expected configuration");
        };
        assert_eq!(config.declared_roots(), Some(vec!["src"]));
    }

    #[tokio::test]
    async fn test_invalid_json_is_message() {
        let runtime = Arc::new(TestRuntime::new().with_file("package.json", "{nope", 1));
        let loader = ProjectConfigurationLoader::new(runtime);

        let result = loader.load_from_path("package.json", None).await;
        assert!(result.resource.is_none());
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages.iter().next().unwrap().severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_missing_file_is_message() {
        let loader = ProjectConfigurationLoader::new(Arc::new(TestRuntime::new()));
        let result = loader.load_from_path("gone/package.json", None).await;
        assert!(result.resource.is_none());
        assert_eq!(result.messages.iter().next().unwrap().code, "io");
    }

    #[test]
    fn test_match_path() {
        let loader = ProjectConfigurationLoader::new(Arc::new(TestRuntime::new()));
        assert!(loader.match_path("a/package.json"));
        assert!(!loader.match_path("a/tsconfig.json"));
    }
}
