//! Project configuration (`package.json`) resources.
//!
//! A configuration owns one or more *haste directories*: by default the
//! directory holding the manifest, or the `haste.roots` entries joined onto
//! it. Every file under a haste directory gets its module id resolved
//! through the configuration, and is invalidated when the configuration
//! changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::{Resource, ResourceKind};
use crate::paths;

static NULL: Value = Value::Null;

/// Parsed manifest data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfiguration {
    pub data: Value,
}

impl ProjectConfiguration {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Whether `path` names a manifest file.
    pub fn matches_path(path: &str) -> bool {
        path.ends_with("package.json")
    }

    /// Build a configuration resource. Its id is its path.
    pub fn resource(path: impl Into<String>, data: Value) -> Resource {
        let path = path.into();
        Resource {
            id: Some(path.clone()),
            path,
            mtime: 0,
            kind: ResourceKind::ProjectConfiguration(Self::new(data)),
        }
    }

    fn haste(&self) -> Option<&Value> {
        self.data.get("haste")
    }

    /// `haste.roots` as declared, if any.
    pub fn declared_roots(&self) -> Option<Vec<&str>> {
        let roots = self.haste()?.get("roots")?.as_array()?;
        Some(roots.iter().filter_map(Value::as_str).collect())
    }

    /// `haste.prefix` as declared, if any.
    pub fn declared_prefix(&self) -> Option<&str> {
        self.haste()?
            .get("prefix")?
            .as_str()
            .filter(|prefix| !prefix.is_empty())
    }
}

/// A shared configuration resource.
///
/// Wraps an `Arc<Resource>` that is known to hold a [`ProjectConfiguration`],
/// and derefs to it. Cloning is cheap, so handles can be moved into spawned
/// load tasks.
#[derive(Clone)]
pub struct ConfigurationHandle {
    resource: Arc<Resource>,
}

impl ConfigurationHandle {
    /// Returns `None` when `resource` is not a project configuration.
    pub fn new(resource: Arc<Resource>) -> Option<Self> {
        resource.as_configuration()?;
        Some(Self { resource })
    }

    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }

    pub fn path(&self) -> &str {
        &self.resource.path
    }

    pub fn data(&self) -> &Value {
        self.resource
            .as_configuration()
            .map(|config| &config.data)
            .unwrap_or(&NULL)
    }

    /// Directory holding the manifest.
    pub fn dirname(&self) -> &str {
        paths::dirname(self.path())
    }

    /// Directories this configuration governs.
    pub fn haste_directories(&self) -> Vec<String> {
        let dirname = self.dirname();
        match self.declared_roots() {
            Some(roots) => roots.into_iter().map(|root| paths::join(dirname, root)).collect(),
            None => vec![dirname.to_string()],
        }
    }

    /// Id prefix: `haste.prefix`, else the basename of the manifest directory.
    pub fn haste_prefix(&self) -> &str {
        self.declared_prefix()
            .unwrap_or_else(|| paths::basename(self.dirname()))
    }

    /// Resolve the module id of `file_path` under this configuration.
    ///
    /// `.js` is stripped and `index.js` collapses to its directory. Returns
    /// `None` when the path is outside every haste directory.
    pub fn resolve_id(&self, file_path: &str) -> Option<String> {
        let stem = if paths::basename(file_path) == "index.js" {
            paths::dirname(file_path)
        } else {
            file_path.strip_suffix(".js").unwrap_or(file_path)
        };

        let prefix = self.haste_prefix();
        self.haste_directories().iter().find_map(|dir| {
            let relative = paths::strip_dir(dir, stem)?;
            Some(if prefix.is_empty() {
                relative.to_string()
            } else {
                paths::join(prefix, relative)
            })
        })
    }
}

impl Deref for ConfigurationHandle {
    type Target = ProjectConfiguration;

    fn deref(&self) -> &ProjectConfiguration {
        // `new` guarantees the variant; the fallback is never observed.
        static EMPTY: ProjectConfiguration = ProjectConfiguration { data: Value::Null };
        self.resource.as_configuration().unwrap_or(&EMPTY)
    }
}

impl fmt::Debug for ConfigurationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationHandle")
            .field("path", &self.path())
            .finish()
    }
}

impl PartialEq for ConfigurationHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}
