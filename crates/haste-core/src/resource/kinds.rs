use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// Payload of a `JS` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsModule {
    #[serde(skip_serializing_if = "is_false")]
    pub is_module: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_javelin: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_run_when_ready: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_polyfill: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_legacy: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_permanent: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_nopackage: bool,
    #[serde(rename = "isJSXEnabled", skip_serializing_if = "is_false")]
    pub is_jsx_enabled: bool,
    #[serde(rename = "jsxDOMImplementor", skip_serializing_if = "String::is_empty")]
    pub jsx_dom_implementor: String,
    /// Deflated size in bytes; zero when not measured.
    #[serde(skip_serializing_if = "is_zero")]
    pub network_size: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_modules: Vec<String>,
    #[serde(rename = "requiredCSS", skip_serializing_if = "Vec::is_empty")]
    pub required_css: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_legacy_components: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_dynamic_modules: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_lazy_modules: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggests: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, bool>,
}

/// Payload of a `CSS` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stylesheet {
    #[serde(skip_serializing_if = "is_false")]
    pub is_nopackage: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_nonblocking: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_module: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_permanent: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub network_size: u64,
    #[serde(rename = "requiredCSS", skip_serializing_if = "Vec::is_empty")]
    pub required_css: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_legacy_components: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fb_sprites: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, bool>,
}

/// Payload of an `Image` resource. Zero means "not yet measured".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageInfo {
    #[serde(skip_serializing_if = "is_zero")]
    pub width: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub height: u64,
}

impl ImageInfo {
    pub fn is_measured(&self) -> bool {
        self.width != 0 && self.height != 0
    }
}

/// Payload of a `JSTest` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestInfo {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_modules: Vec<String>,
    #[serde(rename = "requiredCSS", skip_serializing_if = "Vec::is_empty")]
    pub required_css: Vec<String>,
}

/// Payload of a `JSMock` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MockInfo {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_modules: Vec<String>,
}

/// Payload of a `JSBench` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BenchInfo {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_modules: Vec<String>,
    #[serde(rename = "requiredCSS", skip_serializing_if = "Vec::is_empty")]
    pub required_css: Vec<String>,
}
