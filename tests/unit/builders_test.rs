//! Tests for builder modules and the YAML library loader

use std::fs;

use coral::builders::{build_library, LibraryBuilder};
use coral::config::{AllocationConfig, LibraryPaths};
use coral::core::{CoralError, PoolKey};
use coral::infra::{LoadError, ResourceDataLoader, YamlLibraryLoader};

fn write(root: &std::path::Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_yaml_loader_reads_category_dirs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vessels/example_wtiv.yaml", "name: Example WTIV\ncrane:\n  max_lift: 1200\n");
    write(dir.path(), "ports/njwp.yaml", "name: NJ Wind Port\nnum_cranes: 2\n");

    let loader = YamlLibraryLoader::new(LibraryPaths::new(dir.path()));
    let data = loader.load(&PoolKey::new("wtiv", "example_wtiv")).unwrap();
    assert_eq!(data["crane"]["max_lift"], 1200);
    let data = loader.load(&PoolKey::new("port", "njwp")).unwrap();
    assert_eq!(data["num_cranes"], 2);
}

#[test]
fn test_build_library_skips_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ports/njwp.yaml", "name: NJ Wind Port\n");

    let allocation = AllocationConfig::new()
        .with("port", "njwp", 1)
        .with("wtiv", "ghost_vessel", 1);
    let loader = YamlLibraryLoader::new(LibraryPaths::new(dir.path()));
    let library = build_library(&allocation, &loader).unwrap();

    assert!(library.pool("port", "njwp").is_some());
    assert_eq!(library.skipped().len(), 1);
    assert!(library.skipped()[0].location.ends_with("ghost_vessel.yaml"));
}

#[test]
fn test_malformed_yaml_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ports/broken.yaml", "name: [unclosed\n");

    let loader = YamlLibraryLoader::new(LibraryPaths::new(dir.path()));
    let err = loader.load(&PoolKey::new("port", "broken")).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { .. }));

    let allocation = AllocationConfig::new().with("port", "broken", 1);
    let err = build_library(&allocation, &loader).unwrap_err();
    assert!(matches!(err, CoralError::ResourceData { .. }));
}

#[test]
fn test_library_builder() {
    let library = LibraryBuilder::new()
        .pool("wtiv", "a", 2, serde_json::json!({"speed": 10}))
        .pool("port", "b", 1, serde_json::Value::Null)
        .build()
        .unwrap();
    assert_eq!(library.pools().count(), 2);
    assert_eq!(library.pool("wtiv", "a").unwrap().capacity(), 2);
    assert_eq!(library.total_in_use(), 0);
}
