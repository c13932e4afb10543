//! Prefix tree from haste directories to the configuration that owns them.
//!
//! ```text
//!            (root)
//!              │
//!              a
//!              │
//!              b ── config: a/b/package.json
//!            ┌─┴─┐
//!            c   d ── config: a/b/d/package.json
//! ```
//!
//! `find_configuration("a/b/d/x/y.js")` walks `a → b → d → x`, remembering
//! the last node that carried a configuration, and returns the one at `d`.
//! The trie is rebuilt whenever the set of configurations changes.

use rustc_hash::FxHashMap;

use crate::paths;
use crate::resource::ConfigurationHandle;

#[derive(Debug, Default, Clone)]
struct Node {
    configuration: Option<ConfigurationHandle>,
    children: FxHashMap<String, Node>,
}

/// Nearest-enclosing-configuration index.
#[derive(Debug, Default, Clone)]
pub struct ConfigurationTrie {
    root: Node,
    configurations: Vec<ConfigurationHandle>,
}

impl ConfigurationTrie {
    pub fn new(configurations: impl IntoIterator<Item = ConfigurationHandle>) -> Self {
        let mut trie = Self::default();
        for configuration in configurations {
            trie.index(configuration);
        }
        trie
    }

    /// Index `configuration` at each of its haste directories.
    ///
    /// A configuration indexed at a node that already has one replaces it.
    pub fn index(&mut self, configuration: ConfigurationHandle) {
        for dir in configuration.haste_directories() {
            let mut node = &mut self.root;
            for segment in paths::segments(&dir) {
                node = node.children.entry(segment.to_string()).or_default();
            }
            node.configuration = Some(configuration.clone());
        }
        self.configurations.push(configuration);
    }

    /// Configuration governing `path`, if any.
    pub fn find_configuration(&self, path: &str) -> Option<&ConfigurationHandle> {
        let segments: Vec<&str> = paths::segments(path).collect();
        let dirs = &segments[..segments.len().saturating_sub(1)];

        let mut node = &self.root;
        let mut found = node.configuration.as_ref();
        for segment in dirs {
            match node.children.get(*segment) {
                Some(child) => {
                    node = child;
                    if child.configuration.is_some() {
                        found = child.configuration.as_ref();
                    }
                }
                None => break,
            }
        }
        found
    }

    /// Every indexed configuration, in indexing order.
    pub fn configurations(&self) -> &[ConfigurationHandle] {
        &self.configurations
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}
