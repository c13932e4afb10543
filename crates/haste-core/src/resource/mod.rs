//! Resource data model.
//!
//! A [`Resource`] is the analyzed form of one file. The fields every resource
//! carries (`path`, `id`, `mtime`) live on the struct; everything specific to
//! a file type lives in the [`ResourceKind`] variant. On disk the two are
//! flattened into one object tagged with `type`:
//!
//! ```json
//! { "type": "JS", "path": "a/b.js", "id": "b", "mtime": 10, "requiredModules": ["c"] }
//! ```
//!
//! Resources are immutable once they enter a [`ResourceMap`](crate::ResourceMap):
//! an update produces a new value that replaces the old one wholesale.

mod configuration;
mod kinds;

pub use configuration::{ConfigurationHandle, ProjectConfiguration};
pub use kinds::{BenchInfo, ImageInfo, JsModule, MockInfo, Stylesheet, TestInfo};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag selecting which loader produced a resource and which bucket of the
/// resource map it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Resource,
    #[serde(rename = "JS")]
    Js,
    #[serde(rename = "CSS")]
    Css,
    Image,
    #[serde(rename = "JSTest")]
    JsTest,
    #[serde(rename = "JSMock")]
    JsMock,
    #[serde(rename = "JSBench")]
    JsBench,
    ProjectConfiguration,
}

impl ResourceType {
    pub const ALL: [ResourceType; 8] = [
        ResourceType::Resource,
        ResourceType::Js,
        ResourceType::Css,
        ResourceType::Image,
        ResourceType::JsTest,
        ResourceType::JsMock,
        ResourceType::JsBench,
        ResourceType::ProjectConfiguration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Resource => "Resource",
            ResourceType::Js => "JS",
            ResourceType::Css => "CSS",
            ResourceType::Image => "Image",
            ResourceType::JsTest => "JSTest",
            ResourceType::JsMock => "JSMock",
            ResourceType::JsBench => "JSBench",
            ResourceType::ProjectConfiguration => "ProjectConfiguration",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("unknown resource type '{}'", s))
    }
}

/// Type-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceKind {
    /// A file with no type-specific analysis.
    #[serde(rename = "Resource")]
    Generic,
    #[serde(rename = "JS")]
    Js(JsModule),
    #[serde(rename = "CSS")]
    Css(Stylesheet),
    Image(ImageInfo),
    #[serde(rename = "JSTest")]
    JsTest(TestInfo),
    #[serde(rename = "JSMock")]
    JsMock(MockInfo),
    #[serde(rename = "JSBench")]
    JsBench(BenchInfo),
    ProjectConfiguration(ProjectConfiguration),
}

impl ResourceKind {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceKind::Generic => ResourceType::Resource,
            ResourceKind::Js(_) => ResourceType::Js,
            ResourceKind::Css(_) => ResourceType::Css,
            ResourceKind::Image(_) => ResourceType::Image,
            ResourceKind::JsTest(_) => ResourceType::JsTest,
            ResourceKind::JsMock(_) => ResourceType::JsMock,
            ResourceKind::JsBench(_) => ResourceType::JsBench,
            ResourceKind::ProjectConfiguration(_) => ResourceType::ProjectConfiguration,
        }
    }
}

/// One analyzed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique key within a resource map.
    pub path: String,
    /// Logical module identifier, when the loader could resolve one.
    #[serde(default)]
    pub id: Option<String>,
    /// Last-seen modification time in milliseconds.
    #[serde(default)]
    pub mtime: u64,
    #[serde(flatten)]
    pub kind: ResourceKind,
}

impl Resource {
    pub fn new(path: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            path: path.into(),
            id: None,
            mtime: 0,
            kind,
        }
    }

    /// A generic resource whose id is its path.
    pub fn generic(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: Some(path.clone()),
            path,
            mtime: 0,
            kind: ResourceKind::Generic,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    pub fn resource_type(&self) -> ResourceType {
        self.kind.resource_type()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn as_js(&self) -> Option<&JsModule> {
        match &self.kind {
            ResourceKind::Js(js) => Some(js),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageInfo> {
        match &self.kind {
            ResourceKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_configuration(&self) -> Option<&ProjectConfiguration> {
        match &self.kind {
            ResourceKind::ProjectConfiguration(config) => Some(config),
            _ => None,
        }
    }

    /// Modules this resource depends on, regardless of its type.
    pub fn required_modules(&self) -> &[String] {
        match &self.kind {
            ResourceKind::Js(js) => &js.required_modules,
            ResourceKind::JsTest(test) => &test.required_modules,
            ResourceKind::JsMock(mock) => &mock.required_modules,
            ResourceKind::JsBench(bench) => &bench.required_modules,
            _ => &[],
        }
    }
}
