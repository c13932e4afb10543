//! Persisting the resource map.
//!
//! The cache is a single JSON document:
//!
//! ```json
//! { "version": "0.1", "typeHash": "JS_0.0:CSS_0.0", "objects": [ ... ] }
//! ```
//!
//! A cache is trusted only when both `version` and `typeHash` match the
//! serializer's own. Anything else (missing file, bad JSON, mismatch,
//! unknown resource type) reads as "no cache" and the caller starts from an
//! empty map. Cache problems are never fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::resource::Resource;
use crate::resource_map::ResourceMap;
use crate::resource_types::ResourceTypes;
use crate::runtime::{Runtime, RuntimeError};

/// Current on-disk format version.
pub const FORMAT_VERSION: &str = "0.1";

#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] RuntimeError),

    #[error("cache is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("cache type hash mismatch: expected {expected}, found {found}")]
    TypeHashMismatch { expected: String, found: String },

    #[error("cache is malformed: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, SerializerError>;

/// Plain-data projection of a resource map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedMap {
    pub version: String,
    #[serde(rename = "typeHash", default, skip_serializing_if = "Option::is_none")]
    pub type_hash: Option<String>,
    pub objects: Vec<Arc<Resource>>,
}

#[derive(Debug, Clone)]
pub struct ResourceMapSerializer {
    version: String,
    type_hash: String,
}

impl ResourceMapSerializer {
    pub fn new(types: &ResourceTypes) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            type_hash: types.type_hash(),
        }
    }

    /// Fold a caller-chosen cache version into the format version, so a
    /// bump on either side invalidates existing caches.
    pub fn with_cache_version(mut self, cache_version: &str) -> Self {
        if !cache_version.is_empty() {
            self.version = format!("{}-{}", FORMAT_VERSION, cache_version);
        }
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn type_hash(&self) -> &str {
        &self.type_hash
    }

    pub fn to_object(&self, map: &ResourceMap) -> SerializedMap {
        SerializedMap {
            version: self.version.clone(),
            type_hash: Some(self.type_hash.clone()),
            objects: map.get_all().to_vec(),
        }
    }

    /// Rebuild a map, or `None` when either gate rejects the data.
    pub fn from_object(&self, serialized: SerializedMap) -> Option<ResourceMap> {
        match self.check_gates(&serialized.version, serialized.type_hash.as_deref()) {
            Ok(()) => Some(Self::build(serialized.objects)),
            Err(err) => {
                debug!(error = %err, "discarding cached resource map");
                None
            }
        }
    }

    /// Parse a cache document, checking the gates before decoding objects.
    pub fn parse(&self, bytes: &[u8]) -> Result<ResourceMap> {
        let mut document: Value = serde_json::from_slice(bytes)?;
        let version = document
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| SerializerError::Malformed("missing version".into()))?;
        let type_hash = document.get("typeHash").and_then(Value::as_str);
        self.check_gates(version, type_hash)?;

        let objects = document
            .get_mut("objects")
            .map(Value::take)
            .ok_or_else(|| SerializerError::Malformed("missing objects".into()))?;
        let objects: Vec<Arc<Resource>> = serde_json::from_value(objects)?;
        Ok(Self::build(objects))
    }

    /// Load a map from `path`, or `None` when there is no usable cache.
    pub async fn load_from_path(&self, runtime: &dyn Runtime, path: &Path) -> Option<ResourceMap> {
        let loaded = async {
            let bytes = runtime.read_file(path).await?;
            self.parse(&bytes)
        }
        .await;

        match loaded {
            Ok(map) => Some(map),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no usable resource map cache");
                None
            }
        }
    }

    pub async fn store_to_path(
        &self,
        runtime: &dyn Runtime,
        path: &Path,
        map: &ResourceMap,
    ) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !runtime.exists(parent) {
                runtime.create_dir(parent, true).await?;
            }
        }
        let bytes = serde_json::to_vec(&self.to_object(map))?;
        runtime.write_file(path, &bytes).await?;
        Ok(())
    }

    fn check_gates(&self, version: &str, type_hash: Option<&str>) -> Result<()> {
        if version != self.version {
            return Err(SerializerError::VersionMismatch {
                expected: self.version.clone(),
                found: version.to_string(),
            });
        }
        let found = type_hash.unwrap_or_default();
        if found != self.type_hash {
            return Err(SerializerError::TypeHashMismatch {
                expected: self.type_hash.clone(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    fn build(objects: Vec<Arc<Resource>>) -> ResourceMap {
        let mut map = ResourceMap::new();
        for resource in objects {
            map.add(resource);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{JsModule, ResourceKind, ResourceType, Stylesheet};
    use crate::runtime::test_utils::TestRuntime;

    fn serializer() -> ResourceMapSerializer {
        ResourceMapSerializer {
            version: FORMAT_VERSION.to_string(),
            type_hash: "JSTest_0.0:JS_0.0:CSS_0.0".to_string(),
        }
    }

    fn sample_map() -> ResourceMap {
        ResourceMap::from_resources([
            Resource::new(
                "a/b.js",
                ResourceKind::Js(JsModule {
                    required_modules: vec!["foo".into(), "bar".into()],
                    ..Default::default()
                }),
            )
            .with_id("b")
            .with_mtime(7),
            Resource::new(
                "a/b.css",
                ResourceKind::Css(Stylesheet {
                    is_nonblocking: true,
                    ..Default::default()
                }),
            )
            .with_id("b-css"),
        ])
    }

    #[test]
    fn test_object_roundtrip_two_types() {
        let s = serializer();
        let map = sample_map();
        let restored = s.from_object(s.to_object(&map)).unwrap();

        assert_eq!(restored.len(), 2);
        let js = restored.get(ResourceType::Js, "b").unwrap();
        assert_eq!(js.as_js().unwrap().required_modules, vec!["foo", "bar"]);
        assert_eq!(js.mtime, 7);
        let css = restored.get(ResourceType::Css, "b-css").unwrap();
        assert_eq!(css.resource_type(), ResourceType::Css);
        for resource in map.get_all() {
            assert_eq!(**restored.get_by_path(&resource.path).unwrap(), **resource);
        }
    }

    #[test]
    fn test_version_gate() {
        let s = serializer();
        let mut object = s.to_object(&sample_map());
        object.version = "0.0".into();
        assert!(s.from_object(object).is_none());
    }

    #[test]
    fn test_type_hash_gate() {
        let s = serializer();
        let mut object = s.to_object(&sample_map());
        object.type_hash = Some("JS_0.0".into());
        assert!(s.from_object(object.clone()).is_none());
        object.type_hash = None;
        assert!(s.from_object(object).is_none());
    }

    #[test]
    fn test_cache_version_changes_version() {
        let s = serializer().with_cache_version("42");
        assert_eq!(s.version(), "0.1-42");
        assert_eq!(serializer().with_cache_version("").version(), "0.1");
    }

    #[test]
    fn test_parse_rejects_corruption() {
        let s = serializer();
        assert!(matches!(s.parse(b"{not json"), Err(SerializerError::Json(_))));

        let bytes = serde_json::to_vec(&s.to_object(&sample_map())).unwrap();
        let mut doc: Value = serde_json::from_slice(&bytes).unwrap();
        doc["version"] = Value::from("9.9");
        let err = s.parse(&serde_json::to_vec(&doc).unwrap()).unwrap_err();
        assert!(matches!(err, SerializerError::VersionMismatch { .. }));

        doc["version"] = Value::from(FORMAT_VERSION);
        doc["objects"][0]["type"] = Value::from("Unknown");
        assert!(s.parse(&serde_json::to_vec(&doc).unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let runtime = TestRuntime::new();
        let s = serializer();
        let path = Path::new("cache/map.json");

        s.store_to_path(&runtime, path, &sample_map()).await.unwrap();
        let map = s.load_from_path(&runtime, path).await.unwrap();
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_cache_is_none() {
        let runtime = TestRuntime::new();
        assert!(
            serializer()
                .load_from_path(&runtime, Path::new("nope.json"))
                .await
                .is_none()
        );
    }
}
