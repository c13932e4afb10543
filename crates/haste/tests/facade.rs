//! Facade tests: cache load, update, store.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use haste::{FileFinder, Haste, HasteConfig, HasteOptions, ResourceType, UpdateError};
use haste_core::Runtime;
use haste_core::runtime::test_utils::TestRuntime;
use haste_loaders::{LoaderOptions, default_loaders};
use tempfile::TempDir;

const CACHE: &str = ".haste/cache.json";

/// Lists the runtime's files, minus the cache itself.
#[derive(Debug)]
struct RuntimeFinder(Arc<TestRuntime>);

#[async_trait]
impl FileFinder for RuntimeFinder {
    async fn find(&self) -> Result<Vec<(String, u64)>, UpdateError> {
        Ok(self
            .0
            .listing()
            .into_iter()
            .filter(|(path, _)| !path.starts_with(".haste/"))
            .collect())
    }
}

fn project() -> Arc<TestRuntime> {
    Arc::new(
        TestRuntime::new()
            .with_file("lib/package.json", r#"{"haste": {"prefix": "lib"}}"#, 10)
            .with_file("lib/util.js", "module.exports = {};", 10)
            .with_file("lib/view.js", "var util = require('./util');", 10)
            .with_file("lib/view.css", "/**\n * @provides view-css\n */\n.v {}", 10)
            .with_file("lib/logo.gif", b"GIF89a\x02\x00\x03\x00", 10),
    )
}

fn facade(runtime: &Arc<TestRuntime>, cache_version: Option<&str>) -> Haste {
    let loaders = default_loaders(runtime.clone(), &LoaderOptions::default());
    let options = HasteOptions {
        cache_version: cache_version.map(str::to_string),
        ..Default::default()
    };
    Haste::new(loaders, vec!["lib".into()], options)
        .with_runtime(runtime.clone())
        .with_finder(Arc::new(RuntimeFinder(runtime.clone())))
}

#[tokio::test]
async fn test_cold_then_warm_update() {
    let runtime = project();
    let haste = facade(&runtime, None);
    let cache = Path::new(CACHE);

    let cold = haste.update(cache).await.unwrap();
    assert!(cold.stored);
    assert_eq!(cold.outcome.changes.len(), 5);
    assert!(runtime.exists(cache));

    let map = &cold.map;
    assert!(map.get(ResourceType::Js, "lib/util").is_some());
    assert!(map.get(ResourceType::Css, "view-css").is_some());
    let logo = map.get_by_path("lib/logo.gif").unwrap().as_image().unwrap();
    assert_eq!((logo.width, logo.height), (2, 3));

    let warm = haste.update(cache).await.unwrap();
    assert!(!warm.stored);
    assert!(warm.outcome.changes.is_empty());
    assert_eq!(warm.map.len(), 5);
    assert_eq!(
        warm.map
            .get(ResourceType::Js, "lib/view")
            .unwrap()
            .required_modules(),
        ["lib/util"]
    );
}

#[tokio::test]
async fn test_incremental_update_after_edit() {
    let runtime = project();
    let haste = facade(&runtime, None);
    let cache = Path::new(CACHE);
    haste.update(cache).await.unwrap();

    runtime.insert("lib/util.js", "var x = require('x');", 20);
    runtime.remove("lib/view.css");

    let update = haste.update(cache).await.unwrap();
    assert!(update.stored);
    assert_eq!(update.outcome.changes.len(), 2);

    let util = update.map.get(ResourceType::Js, "lib/util").unwrap();
    assert_eq!(util.mtime, 20);
    assert_eq!(util.required_modules(), ["x"]);
    assert!(update.map.get(ResourceType::Css, "view-css").is_none());
}

#[tokio::test]
async fn test_cache_version_bump_starts_cold() {
    let runtime = project();
    let cache = Path::new(CACHE);
    facade(&runtime, Some("1")).update(cache).await.unwrap();

    let same = facade(&runtime, Some("1")).load_or_create_map(cache).await;
    assert_eq!(same.len(), 5);

    let bumped = facade(&runtime, Some("2")).load_or_create_map(cache).await;
    assert!(bumped.is_empty());
}

#[tokio::test]
async fn test_corrupt_cache_starts_cold() {
    let runtime = project();
    let cache = Path::new(CACHE);
    runtime.insert(CACHE, "{ not json", 1);

    let haste = facade(&runtime, None);
    assert!(haste.load_or_create_map(cache).await.is_empty());

    let update = haste.update(cache).await.unwrap();
    assert_eq!(update.outcome.changes.len(), 5);
    assert_eq!(haste.load_or_create_map(cache).await.len(), 5);
}

#[test]
fn test_serializer_carries_type_hash() {
    let runtime = project();
    let haste = facade(&runtime, Some("7"));
    let serializer = haste.serializer();
    assert_eq!(serializer.version(), "0.1-7");
    assert_eq!(serializer.type_hash(), haste.types().type_hash());
}

#[test]
fn test_finder_uses_loader_extensions() {
    let runtime = project();
    let finder = format!("{:?}", facade(&runtime, None).finder());
    assert!(finder.contains(".css"));
    assert!(finder.contains(".gif"));
}

#[tokio::test]
#[allow(clippy::disallowed_methods)]
async fn test_native_facade_reads_under_root() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("lib")).unwrap();
    std::fs::write(temp.path().join("lib/a.js"), "var b = require('b');").unwrap();
    assert_ne!(std::env::current_dir().unwrap(), temp.path());

    let config = HasteConfig {
        scan_dirs: vec!["lib".into()],
        ..Default::default()
    };
    let haste = Haste::from_config(temp.path(), &config).unwrap();

    let cold = haste.update(&config.cache_path).await.unwrap();
    assert!(
        !cold.outcome.messages.iter().any(|m| m.code == "io"),
        "{:?}",
        cold.outcome.messages
    );
    let a = cold.map.get_by_path("lib/a.js").expect("loaded from the project root");
    assert_eq!(a.required_modules(), ["b"]);
    assert!(cold.stored);
    assert!(temp.path().join(".haste/cache.json").is_file());

    let warm = haste.update(&config.cache_path).await.unwrap();
    assert!(warm.outcome.changes.is_empty());
    assert_eq!(warm.map.len(), 1);
}
