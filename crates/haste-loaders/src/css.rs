use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use haste_core::{
    ConfigurationHandle, LoadResult, Loader, MessageList, Resource, ResourceKind, ResourceType,
    Runtime, Stylesheet,
};

use crate::parse::{css, docblock, network_size};
use crate::read_source;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssLoaderOptions {
    pub network_size: bool,
    pub extract_fb_sprites: bool,
}

/// Loads `*.css` stylesheets.
#[derive(Debug, Clone)]
pub struct CssLoader {
    runtime: Arc<dyn Runtime>,
    options: CssLoaderOptions,
}

impl CssLoader {
    pub fn new(runtime: Arc<dyn Runtime>, options: CssLoaderOptions) -> Self {
        Self { runtime, options }
    }

    pub fn load_from_source(&self, path: &str, source: &str) -> LoadResult {
        let mut messages = MessageList::new();
        let mut resource = Resource::new(path, ResourceKind::Generic);
        let mut sheet = Stylesheet::default();

        for (name, value) in docblock::parse(docblock::extract(source)) {
            match name.as_str() {
                "provides" => resource.id = Some(value),
                "css" => sheet
                    .required_css
                    .extend(docblock::words(&value).map(str::to_string)),
                "nonblocking" => sheet.is_nonblocking = true,
                "nopackage" => sheet.is_nopackage = true,
                "option" | "options" => {
                    for key in docblock::words(&value) {
                        sheet.options.insert(key.to_string(), true);
                    }
                }
                _ => {}
            }
        }

        if self.options.extract_fb_sprites {
            sheet.fb_sprites = css::extract_fb_sprites(source);
        }
        if self.options.network_size {
            match network_size(source) {
                Ok(size) => sheet.network_size = size,
                Err(err) => messages.add_warning(path, "network-size", err.to_string()),
            }
        }

        resource.kind = ResourceKind::Css(sheet);
        LoadResult::loaded(resource, messages)
    }
}

#[async_trait]
impl Loader for CssLoader {
    fn name(&self) -> &str {
        "css"
    }

    fn resource_types(&self) -> &[ResourceType] {
        &[ResourceType::Css]
    }

    fn extensions(&self) -> &[&str] {
        &[".css"]
    }

    fn match_path(&self, path: &str) -> bool {
        path.ends_with(".css")
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

    #[test]
    fn test_docblock_and_sprites() {
        let loader = CssLoader::new(
            Arc::new(TestRuntime::new()),
            CssLoaderOptions {
                network_size: false,
                extract_fb_sprites: true,
            },
        );
        let source = "/**\n * @provides button\n * @css base reset\n * @nonblocking\n * @option rtl\n */\n\
                      .b { -fb-sprite: url(/images/b.png); }";
        let result = loader.load_from_source("css/button.css", source);
        let resource = result.resource.unwrap();
        assert_eq!(resource.id(), Some("button"));

        let ResourceKind::Css(sheet) = &resource.kind else {
            panic!("expected CSS");
        };
        assert_eq!(sheet.required_css, vec!["base", "reset"]);
        assert!(sheet.is_nonblocking);
        assert!(!sheet.is_nopackage);
        assert_eq!(sheet.options.get("rtl"), Some(&true));
        assert_eq!(sheet.fb_sprites, vec!["images/b.png"]);
        assert_eq!(sheet.network_size, 0);
    }
}
