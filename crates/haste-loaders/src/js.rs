//! Script loader.
//!
//! Reads the header docblock for module declarations and flags, resolves the
//! module id through the governing configuration, and collects `require()`
//! dependencies. Post-processing rewrites relative requires (`./util`) into
//! the canonical id of the file they point at.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use haste_core::paths;
use haste_core::{
    ConfigurationHandle, JsModule, LoadResult, Loader, MessageList, PostProcessResult, Resource,
    ResourceKind, ResourceMap, ResourceType, Runtime,
};

use crate::parse::{commonjs, docblock, network_size};
use crate::read_source;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsLoaderOptions {
    /// Measure the deflated size of every script.
    pub network_size: bool,
    /// Also collect `requireDynamic` and `requireLazy` targets.
    pub extract_special_requires: bool,
}

#[derive(Debug, Clone)]
pub struct JsLoader {
    runtime: Arc<dyn Runtime>,
    options: JsLoaderOptions,
}

const FUNCTION_DOC_WARNING: &str = "File has a header docblock, but the docblock is class or \
    function documentation, not file documentation. Header blocks should not have @param, \
    @task, @returns, @access, etc.";

fn first_word(value: &str) -> Option<String> {
    docblock::words(value).next().map(str::to_string)
}

impl JsLoader {
    pub fn new(runtime: Arc<dyn Runtime>, options: JsLoaderOptions) -> Self {
        Self { runtime, options }
    }

    fn apply_docblock(
        &self,
        path: &str,
        source: &str,
        resource: &mut Resource,
        js: &mut JsModule,
        messages: &mut MessageList,
    ) {
        for (name, value) in docblock::parse(docblock::extract(source)) {
            match name.as_str() {
                "provides" => {
                    js.is_module = false;
                    resource.id = first_word(&value);
                }
                "providesModule" => {
                    js.is_module = true;
                    resource.id = first_word(&value);
                }
                "providesLegacy" => {
                    js.is_run_when_ready = true;
                    js.is_legacy = true;
                    js.is_module = true;
                    resource.id = first_word(&value).map(|id| format!("legacy:{}", id));
                }
                "css" => js
                    .required_css
                    .extend(docblock::words(&value).map(str::to_string)),
                "requires" => js
                    .required_legacy_components
                    .extend(docblock::words(&value).map(str::to_string)),
                "javelin" => {
                    js.is_module = true;
                    js.is_javelin = true;
                    js.is_run_when_ready = true;
                }
                "polyfill" => js.is_polyfill = true,
                "runWhenReady_DEPRECATED" => js.is_run_when_ready = true,
                "jsx" => {
                    js.is_jsx_enabled = true;
                    js.jsx_dom_implementor = value.clone();
                    if !value.is_empty() {
                        js.required_modules.push(value);
                    }
                }
                "permanent" => js.is_permanent = true,
                "nopackage" => js.is_nopackage = true,
                "option" | "options" => {
                    for key in docblock::words(&value) {
                        js.options.insert(key.to_string(), true);
                    }
                }
                "suggests" => messages.add_clowntown(
                    path,
                    "docblock",
                    "@suggests is deprecated. Simply use the Bootloader APIs.",
                ),
                "param" | "params" | "task" | "return" | "returns" | "access" => {
                    messages.add_warning(path, "docblock", FUNCTION_DOC_WARNING)
                }
                "author" | "deprecated" | "javelin-installs" | "nolint" | "generated"
                | "preserve-header" | "emails" | "layer" => {}
                other => {
                    messages.add_clowntown(path, "docblock", format!("Unknown directive {}", other))
                }
            }
        }
    }

    /// Build a `JS` resource from already-read source.
    pub fn load_from_source(
        &self,
        path: &str,
        configuration: Option<&ConfigurationHandle>,
        source: &str,
    ) -> LoadResult {
        let mut messages = MessageList::new();
        let mut resource = Resource::new(path, ResourceKind::Generic);
        let mut js = JsModule {
            is_module: configuration.is_some(),
            ..Default::default()
        };

        self.apply_docblock(path, source, &mut resource, &mut js, &mut messages);

        if js.options.get("ignore").copied().unwrap_or(false) {
            resource.kind = ResourceKind::Js(js);
            return LoadResult::loaded(resource, messages);
        }

        if js.is_module {
            if resource.id.is_none() {
                resource.id = configuration.and_then(|config| config.resolve_id(path));
            }
            for name in commonjs::extract_require_calls(source) {
                if !js.required_modules.contains(&name) {
                    js.required_modules.push(name);
                }
            }
            if self.options.extract_special_requires {
                js.required_dynamic_modules = commonjs::extract_dynamic_requires(source);
                js.required_lazy_modules = commonjs::extract_lazy_requires(source);
            }
        }

        if self.options.network_size {
            match network_size(source) {
                Ok(size) => js.network_size = size,
                Err(err) => messages.add_warning(path, "network-size", err.to_string()),
            }
        }

        resource.kind = ResourceKind::Js(js);
        LoadResult::loaded(resource, messages)
    }
}

#[async_trait]
impl Loader for JsLoader {
    fn name(&self) -> &str {
        "js"
    }

    fn resource_types(&self) -> &[ResourceType] {
        &[ResourceType::Js]
    }

    fn extensions(&self) -> &[&str] {
        &[".js"]
    }

    fn match_path(&self, path: &str) -> bool {
        path.ends_with(".js")
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

    async fn post_process(&self, map: &ResourceMap, resources: &[Arc<Resource>]) -> PostProcessResult {
        let mut result = PostProcessResult::default();

        for resource in resources {
            let Some(js) = resource.as_js() else {
                continue;
            };
            let dir = paths::dirname(&resource.path);
            let mut rewritten = js.required_modules.clone();
            let mut changed = false;

            for required in rewritten.iter_mut().filter(|r| r.starts_with('.')) {
                let relative = paths::join(dir, required);
                let target = map
                    .get_by_path(&format!("{}.js", relative))
                    .or_else(|| map.get_by_path(&format!("{}/index.js", relative)));
                match target.and_then(|t| t.id.clone()) {
                    Some(id) => {
                        *required = id;
                        changed = true;
                    }
                    None => result.messages.add_message(
                        &resource.path,
                        "resolve",
                        format!("Cannot resolve local path {}", required),
                    ),
                }
            }

            if changed {
                let mut updated = (**resource).clone();
                if let ResourceKind::Js(js) = &mut updated.kind {
                    js.required_modules = rewritten;
                }
                result.updated.push(updated);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haste_core::runtime::test_utils::TestRuntime;
    use haste_core::{ProjectConfiguration, Severity};
    use serde_json::json;

    fn loader(options: JsLoaderOptions) -> JsLoader {
        JsLoader::new(Arc::new(TestRuntime::new()), options)
    }

    fn config(path: &str) -> ConfigurationHandle {
        ConfigurationHandle::new(Arc::new(ProjectConfiguration::resource(path, json!({})))).unwrap()
    }

    #[test]
    fn test_provides_module() {
        let source = "/**\n * @providesModule foo\n * @css a b\n */\nvar x = require('bar');";
        let result = loader(Default::default()).load_from_source("a/foo.js", None, source);
        let resource = result.resource.unwrap();
        let js = resource.as_js().unwrap();

        assert_eq!(resource.id(), Some("foo"));
        assert!(js.is_module);
        assert_eq!(js.required_css, vec!["a", "b"]);
        assert_eq!(js.required_modules, vec!["bar"]);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_non_module_skips_requires() {
        let source = "/** @provides legacy-thing */\nrequire('x');";
        let result = loader(Default::default()).load_from_source("l.js", None, source);
        let resource = result.resource.unwrap();
        assert_eq!(resource.id(), Some("legacy-thing"));
        assert!(resource.as_js().unwrap().required_modules.is_empty());
    }

    #[test]
    fn test_id_from_configuration() {
        let cfg = config("p/package.json");
        let result =
            loader(Default::default()).load_from_source("p/lib/x.js", Some(&cfg), "require('y');");
        let resource = result.resource.unwrap();
        assert_eq!(resource.id(), Some("p/lib/x"));
        assert_eq!(resource.as_js().unwrap().required_modules, vec!["y"]);
    }

    #[test]
    fn test_docblock_diagnostics() {
        let source = "/**\n * @param foo\n * @frobnicate\n * @suggests x\n */";
        let result = loader(Default::default()).load_from_source("d.js", None, source);
        let severities: Vec<Severity> = result.messages.iter().map(|m| m.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Warning, Severity::Clowntown, Severity::Clowntown]
        );
    }

    #[test]
    fn test_ignore_option_stops_early() {
        let source = "/**\n * @providesModule m\n * @option ignore\n */\nrequire('x');";
        let result = loader(Default::default()).load_from_source("m.js", None, source);
        let resource = result.resource.unwrap();
        assert!(resource.as_js().unwrap().required_modules.is_empty());
        assert_eq!(resource.as_js().unwrap().options.get("ignore"), Some(&true));
    }

    #[test]
    fn test_special_requires_and_network_size() {
        let options = JsLoaderOptions {
            network_size: true,
            extract_special_requires: true,
        };
        let source = "/** @providesModule s */\nrequireDynamic('d'); requireLazy(['l'], f);";
        let result = loader(options).load_from_source("s.js", None, source);
        let resource = result.resource.unwrap();
        let js = resource.as_js().unwrap();
        assert_eq!(js.required_dynamic_modules, vec!["d"]);
        assert_eq!(js.required_lazy_modules, vec!["l"]);
        assert!(js.network_size > 0);
    }

    #[tokio::test]
    async fn test_post_process_resolves_relative_requires() {
        let mut map = ResourceMap::new();
        let util = Resource::new("p/util.js", ResourceKind::Js(JsModule::default())).with_id("util");
        let index = Resource::new("p/lib/index.js", ResourceKind::Js(JsModule::default()))
            .with_id("lib");
        let main = Arc::new(
            Resource::new(
                "p/main.js",
                ResourceKind::Js(JsModule {
                    required_modules: vec!["./util".into(), "./lib".into(), "./missing".into()],
                    ..Default::default()
                }),
            )
            .with_id("main"),
        );
        map.add(Arc::new(util));
        map.add(Arc::new(index));
        map.add(Arc::clone(&main));

        let result = loader(Default::default()).post_process(&map, &[main]).await;
        assert_eq!(result.updated.len(), 1);
        assert_eq!(
            result.updated[0].as_js().unwrap().required_modules,
            vec!["util", "lib", "./missing"]
        );
        assert_eq!(result.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_file() {
        let result = loader(Default::default()).load_from_path("nope.js", None).await;
        assert!(result.resource.is_none());
        assert!(result.messages.has_errors());
    }
}
