//! # haste-core
//!
//! Data structures shared by every stage of the haste resource map:
//!
//! ```text
//!  file bytes ──▶ Loader ──▶ Resource ──▶ ResourceMap ──▶ ResourceMapSerializer ──▶ cache.json
//!                   ▲                          │
//!                   │                          ▼
//!            ResourceTypes             ConfigurationTrie
//!        (ordered loader list)   (path ──▶ nearest package.json)
//! ```
//!
//! - [`Resource`] / [`ResourceKind`]: one analyzed file, tagged by type.
//! - [`ResourceMap`]: the index, by path and by `(type, id)`.
//! - [`ConfigurationTrie`]: nearest enclosing project configuration.
//! - [`Loader`] / [`ResourceTypes`]: the pluggable analyzers and their
//!   priority order.
//! - [`ResourceMapSerializer`]: versioned JSON cache, fail-open on load.
//! - [`MessageList`]: diagnostics aggregated across a cycle.
//! - [`Runtime`]: the file I/O seam.
//!
//! The update pipeline that drives all of this lives in the `haste` crate.

pub mod configuration_trie;
pub mod loader;
pub mod messages;
pub mod paths;
pub mod resource;
pub mod resource_map;
pub mod resource_types;
pub mod runtime;
pub mod serializer;

pub use configuration_trie::ConfigurationTrie;
pub use loader::{LoadResult, Loader, PostProcessResult};
pub use messages::{Message, MessageList, Severity};
pub use resource::{
    BenchInfo, ConfigurationHandle, ImageInfo, JsModule, MockInfo, ProjectConfiguration,
    Resource, ResourceKind, ResourceType, Stylesheet, TestInfo,
};
pub use resource_map::ResourceMap;
pub use resource_types::ResourceTypes;
pub use runtime::{NativeRuntime, Runtime, RuntimeError, RuntimeResult};
pub use serializer::{FORMAT_VERSION, ResourceMapSerializer, SerializedMap, SerializerError};
