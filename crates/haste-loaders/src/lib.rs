//! # haste-loaders
//!
//! Concrete [`Loader`] implementations for the haste resource map.
//!
//! | Loader | Paths | Resource |
//! |--------|-------|----------|
//! | [`ProjectConfigurationLoader`] | `**/package.json` | `ProjectConfiguration` |
//! | [`JsTestLoader`] | `**/__tests__/*.js` | `JSTest` |
//! | [`JsMockLoader`] | `**/__mocks__/*.js` | `JSMock` |
//! | [`JsBenchLoader`] | `**/__benchmarks__/*.js` | `JSBench` |
//! | [`JsLoader`] | `**/*.js` | `JS` |
//! | [`CssLoader`] | `**/*.css` | `CSS` |
//! | [`ImageLoader`] | `**/*.{jpg,jpeg,png,gif}` | `Image` |
//! | [`TmplLoader`] | `**/*.tmpl` | `JS` |
//! | [`ResourceLoader`] | anything | `Resource` |
//!
//! [`default_loaders`] returns them in the priority order above, without
//! the template and catch-all loaders: specific directory conventions come
//! first, so that a test file is never claimed by the plain script loader.

mod configuration;
mod css;
mod generic;
mod image;
mod js;
mod js_bench;
mod js_mock;
pub mod parse;
mod tmpl;

pub use configuration::ProjectConfigurationLoader;
pub use css::{CssLoader, CssLoaderOptions};
pub use generic::ResourceLoader;
pub use image::{ImageLoader, ImageLoaderOptions};
pub use js::{JsLoader, JsLoaderOptions};
pub use js_bench::JsBenchLoader;
pub use js_mock::JsMockLoader;
pub use js_test::{JsTestLoader, TestLoaderOptions};
pub use tmpl::TmplLoader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use haste_core::{LoadResult, Loader, Runtime};

/// Options for the default loader set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    pub js: JsLoaderOptions,
    pub css: CssLoaderOptions,
    pub tests: TestLoaderOptions,
    pub images: ImageLoaderOptions,
}

/// The standard loader set, in priority order.
pub fn default_loaders(runtime: Arc<dyn Runtime>, options: &LoaderOptions) -> Vec<Arc<dyn Loader>> {
    let match_sub_dirs = options.tests.match_sub_dirs;
    vec![
        Arc::new(ProjectConfigurationLoader::new(Arc::clone(&runtime))),
        Arc::new(JsTestLoader::new(Arc::clone(&runtime), options.tests.clone())),
        Arc::new(JsMockLoader::new(Arc::clone(&runtime), match_sub_dirs)),
        Arc::new(JsBenchLoader::new(Arc::clone(&runtime), match_sub_dirs)),
        Arc::new(JsLoader::new(Arc::clone(&runtime), options.js.clone())),
        Arc::new(CssLoader::new(Arc::clone(&runtime), options.css.clone())),
        Arc::new(ImageLoader::new(runtime, options.images.clone())),
    ]
}

/// Read `path` as text, or the failed load describing why it could not be.
pub(crate) async fn read_source(runtime: &dyn Runtime, path: &str) -> Result<String, LoadResult> {
    runtime
        .read_to_string(Path::new(path))
        .await
        .map_err(|err| LoadResult::io_error(path, &err))
}

/// `(?:/|^)<dir>/(<name>)\.js$`, where the name may span directories when
/// `match_sub_dirs` is set.
pub(crate) fn special_dir_pattern(dir: &str, match_sub_dirs: bool) -> Regex {
    let name = if match_sub_dirs { ".+" } else { "[^/]+" };
    let pattern = format!(r"(?:/|^){}/({})\.js$", regex::escape(dir), name);
    Regex::new(&pattern).expect("escaped directory pattern is valid")
}

/// `@emails` value split into individual addresses.
pub(crate) fn contacts(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}
