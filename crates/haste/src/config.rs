//! Layered configuration.
//!
//! Priority: environment variables > `haste.json` > defaults.
//!
//! Environment variables use the `HASTE_` prefix with `__` between nested
//! keys, e.g. `HASTE_MAX_OPEN_FILES=50` or `HASTE_IMAGES__MAX_CONCURRENCY=4`.

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use haste_loaders::{
    CssLoaderOptions, ImageLoaderOptions, JsLoaderOptions, LoaderOptions, TestLoaderOptions,
};

use crate::analyze::ShardOptions;
use crate::error::ConfigError;
use crate::update_task::UpdateOptions;

pub const CONFIG_FILE: &str = "haste.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasteConfig {
    /// Directories to crawl, relative to the project root.
    pub scan_dirs: Vec<String>,
    pub cache_path: PathBuf,
    /// Appended to the cache format version; bump to discard old caches.
    pub cache_version: Option<String>,
    pub max_open_files: usize,
    /// Regular expressions over project-relative paths.
    pub ignore_patterns: Vec<String>,
    pub max_shards: usize,
    /// Unset disables sharding.
    pub shard_timeout_ms: Option<u64>,
    pub js: JsLoaderOptions,
    pub css: CssLoaderOptions,
    pub tests: TestLoaderOptions,
    pub images: ImageLoaderOptions,
}

impl Default for HasteConfig {
    fn default() -> Self {
        Self {
            scan_dirs: vec![String::new()],
            cache_path: PathBuf::from(".haste/cache.json"),
            cache_version: None,
            max_open_files: 200,
            ignore_patterns: vec!["(^|/)node_modules/".to_string()],
            max_shards: 4,
            shard_timeout_ms: None,
            js: JsLoaderOptions::default(),
            css: CssLoaderOptions::default(),
            tests: TestLoaderOptions::default(),
            images: ImageLoaderOptions::default(),
        }
    }
}

impl HasteConfig {
    /// Load from defaults, `<root>/haste.json` if present, then the
    /// environment.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_from(Some(&root.join(CONFIG_FILE)))
    }

    /// Like [`Self::load`] with an explicit config file.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_file.filter(|path| path.exists()) {
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(Env::prefixed("HASTE_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|err| ConfigError::Load(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_open_files == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_open_files".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_shards == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_shards".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.images.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "images.max_concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        self.ignore_regexes().map(|_| ())
    }

    pub fn ignore_regexes(&self) -> Result<Vec<Regex>, ConfigError> {
        self.ignore_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|err| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: err.to_string(),
                })
            })
            .collect()
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            js: self.js.clone(),
            css: self.css.clone(),
            tests: self.tests.clone(),
            images: self.images.clone(),
        }
    }

    pub fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            max_open_files: self.max_open_files,
            shards: self.shard_timeout_ms.map(|ms| ShardOptions {
                max_shards: self.max_shards,
                timeout: Duration::from_millis(ms),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = HasteConfig::default();
        assert_eq!(config.max_open_files, 200);
        assert_eq!(config.max_shards, 4);
        assert!(config.validate().is_ok());
        assert!(config.update_options().shards.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            r#"{
                "scan_dirs": ["html", "lib"],
                "max_open_files": 16,
                "shard_timeout_ms": 5000,
                "js": { "network_size": true },
                "images": { "max_concurrency": 2 }
            }"#,
        )
        .unwrap();

        let config = HasteConfig::load(temp.path()).unwrap();
        assert_eq!(config.scan_dirs, vec!["html", "lib"]);
        assert_eq!(config.max_open_files, 16);
        assert!(config.js.network_size);
        assert!(!config.css.network_size);
        assert_eq!(config.images.max_concurrency, 2);
        assert_eq!(config.loader_options().images.max_concurrency, 2);

        let shards = config.update_options().shards.unwrap();
        assert_eq!(shards.max_shards, 4);
        assert_eq!(shards.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validation() {
        let config = HasteConfig {
            max_open_files: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "max_open_files"
        ));

        let config = HasteConfig {
            ignore_patterns: vec!["(unclosed".into()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPattern { .. })));

        let config = HasteConfig {
            images: ImageLoaderOptions { max_concurrency: 0 },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "images.max_concurrency"
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = HasteConfig::load(temp.path()).unwrap();
        assert_eq!(config.cache_path, PathBuf::from(".haste/cache.json"));
    }
}
