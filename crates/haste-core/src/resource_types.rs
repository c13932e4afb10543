//! Ordered loader registry.
//!
//! Registration order is priority order: `__tests__/a.js` matches both the
//! test loader and the JS loader, and whichever was registered first owns
//! it.

use std::sync::Arc;

use crate::loader::Loader;

#[derive(Debug, Clone, Default)]
pub struct ResourceTypes {
    loaders: Vec<Arc<dyn Loader>>,
}

impl ResourceTypes {
    pub fn new(loaders: Vec<Arc<dyn Loader>>) -> Self {
        Self { loaders }
    }

    pub fn loaders(&self) -> &[Arc<dyn Loader>] {
        &self.loaders
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// First loader whose predicate accepts `path`.
    pub fn loader_for_path(&self, path: &str) -> Option<&Arc<dyn Loader>> {
        self.loaders.iter().find(|loader| loader.match_path(path))
    }

    /// Index of [`Self::loader_for_path`]'s match.
    pub fn position_for_path(&self, path: &str) -> Option<usize> {
        self.loaders.iter().position(|loader| loader.match_path(path))
    }

    pub fn configuration_loader(&self) -> Option<&Arc<dyn Loader>> {
        self.loaders
            .iter()
            .find(|loader| loader.is_configuration_loader())
    }

    /// Union of every loader's extensions, first occurrence order.
    pub fn extensions(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for ext in self.loaders.iter().flat_map(|loader| loader.extensions()) {
            if !out.iter().any(|seen| seen == ext) {
                out.push(ext.to_string());
            }
        }
        out
    }

    /// `Type_version` pairs joined with `:`, in registration order.
    ///
    /// Stored alongside cached maps; a different hash means the cache was
    /// produced by a different loader set.
    pub fn type_hash(&self) -> String {
        self.loaders
            .iter()
            .flat_map(|loader| {
                loader
                    .resource_types()
                    .iter()
                    .map(move |ty| format!("{}_{}", ty, loader.version()))
            })
            .collect::<Vec<_>>()
            .join(":")
    }
}
