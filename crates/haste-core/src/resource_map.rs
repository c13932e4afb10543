//! The durable resource index.
//!
//! Resources are keyed by path (the source of truth for existence) and by
//! `(type, id)` for module lookups. Bulk views and the configuration trie are
//! computed lazily on first use and dropped on every mutation.

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::configuration_trie::ConfigurationTrie;
use crate::resource::{ConfigurationHandle, Resource, ResourceType};

#[derive(Debug, Default, Clone)]
pub struct ResourceMap {
    by_path: FxHashMap<String, Arc<Resource>>,
    by_type: FxHashMap<ResourceType, FxHashMap<String, Arc<Resource>>>,
    all: OnceCell<Vec<Arc<Resource>>>,
    trie: OnceCell<ConfigurationTrie>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut map = Self::new();
        for resource in resources {
            map.add(Arc::new(resource));
        }
        map
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn get(&self, ty: ResourceType, id: &str) -> Option<&Arc<Resource>> {
        self.by_type.get(&ty)?.get(id)
    }

    pub fn get_by_path(&self, path: &str) -> Option<&Arc<Resource>> {
        self.by_path.get(path)
    }

    /// All resources, sorted by path.
    pub fn get_all(&self) -> &[Arc<Resource>] {
        self.all.get_or_init(|| {
            let mut all: Vec<Arc<Resource>> = self.by_path.values().cloned().collect();
            all.sort_by(|a, b| a.path.cmp(&b.path));
            all
        })
    }

    /// All resources of one type, sorted by path.
    pub fn get_all_by_type(&self, ty: ResourceType) -> Vec<Arc<Resource>> {
        self.get_all()
            .iter()
            .filter(|resource| resource.resource_type() == ty)
            .cloned()
            .collect()
    }

    /// Every project configuration in the map.
    pub fn configurations(&self) -> Vec<ConfigurationHandle> {
        self.get_all()
            .iter()
            .filter_map(|resource| ConfigurationHandle::new(Arc::clone(resource)))
            .collect()
    }

    /// Configuration governing `path`, using a trie cached until the next
    /// mutation.
    pub fn get_configuration_by_path(&self, path: &str) -> Option<&ConfigurationHandle> {
        self.trie
            .get_or_init(|| ConfigurationTrie::new(self.configurations()))
            .find_configuration(path)
    }

    /// Insert `resource`. A resource already stored at the same path is
    /// replaced.
    pub fn add(&mut self, resource: Arc<Resource>) {
        if let Some(existing) = self.by_path.get(&resource.path).cloned() {
            self.remove(&existing);
        }
        if let Some(id) = resource.id.clone() {
            self.by_type
                .entry(resource.resource_type())
                .or_default()
                .insert(id, Arc::clone(&resource));
        }
        self.by_path.insert(resource.path.clone(), resource);
        self.invalidate();
    }

    /// Replace `old` with `new`.
    pub fn update(&mut self, old: &Arc<Resource>, new: Arc<Resource>) {
        self.remove(old);
        self.add(new);
    }

    /// Remove `resource` if this exact instance is still stored.
    ///
    /// Slots that have since been taken by another instance are left alone,
    /// so removing a stale handle twice is harmless. Returns whether anything
    /// was removed.
    pub fn remove(&mut self, resource: &Arc<Resource>) -> bool {
        let mut removed = false;

        if self
            .by_path
            .get(&resource.path)
            .is_some_and(|stored| Arc::ptr_eq(stored, resource))
        {
            self.by_path.remove(&resource.path);
            removed = true;
        }

        if let Some(id) = resource.id() {
            let ty = resource.resource_type();
            if let Some(slots) = self.by_type.get_mut(&ty) {
                if slots.get(id).is_some_and(|stored| Arc::ptr_eq(stored, resource)) {
                    slots.remove(id);
                    removed = true;
                }
                if slots.is_empty() {
                    self.by_type.remove(&ty);
                }
            }
        }

        if removed {
            self.invalidate();
        }
        removed
    }

    fn invalidate(&mut self) {
        self.all = OnceCell::new();
        self.trie = OnceCell::new();
    }
}
