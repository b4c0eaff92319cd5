//! Tests for configuration parsing and validation

use coral::config::{
    AllocationConfig, ConfigValue, LibraryPaths, ProjectConfig, ScenarioConfig, ScenarioSet,
    StartTime,
};
use coral::core::PoolKey;

#[test]
fn test_allocation_from_yaml() {
    let cfg = AllocationConfig::from_yaml_str(
        "wtiv: [example_wtiv, 1]\nport:\n  - [new_bedford, 1]\n  - [njwp, 2]\n",
    )
    .unwrap();
    let pools = cfg.pools();
    assert_eq!(pools.len(), 3);
    assert!(pools.contains(&(PoolKey::new("wtiv", "example_wtiv"), 1)));
}

#[test]
fn test_allocation_rejects_empty_name() {
    let result = AllocationConfig::from_json_str(r#"{"port": ["", 1]}"#);
    assert!(result.is_err());
}

#[test]
fn test_allocation_rejects_negative_capacity() {
    let result = AllocationConfig::from_json_str(r#"{"port": ["salem", -1]}"#);
    assert!(result.is_err());
}

#[test]
fn test_project_config_from_json() {
    let cfg = ProjectConfig::from_json_str(
        r#"{
            "project_name": "Empire Wind",
            "project_start": "2026-03-01",
            "wtiv": "_shared_pool_:example_wtiv",
            "port": "_shared_pool_:njwp",
            "plant": {"num_turbines": 50}
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.base_name(), "Empire Wind");
    assert!(cfg.start().unwrap().is_date());
    assert_eq!(cfg.shared_pools().count(), 2);
    assert!(matches!(cfg.get("plant"), Some(ConfigValue::Literal(_))));
}

#[test]
fn test_project_config_must_be_object() {
    assert!(ProjectConfig::from_json_str("[1, 2]").is_err());
}

#[test]
fn test_start_time_serde() {
    let start: StartTime = serde_json::from_str("12.5").unwrap();
    assert_eq!(start, StartTime::Offset(12.5));
    let start: StartTime = serde_json::from_str(r#""2025-01-01""#).unwrap();
    assert!(start.is_date());
    assert!(serde_json::from_str::<StartTime>("-3").is_err());
}

#[test]
fn test_scenario_set_from_yaml() {
    let set = ScenarioSet::from_yaml_str(
        r#"
scenarios:
  - name: base
    allocations:
      wtiv: [example_wtiv, 1]
      port: [njwp, 1]
  - name: add_vessel
    allocations:
      wtiv: [example_wtiv, 1]
      port: [njwp, 1]
    future_resources:
      - category: wtiv
        name: example_wtiv
        dates: ["2027-01-01"]
"#,
    )
    .unwrap();
    assert_eq!(set.scenarios.len(), 2);
    assert_eq!(set.scenarios[1].future_resources[0].dates.len(), 1);
}

#[test]
fn test_scenario_requires_name() {
    let scenario = ScenarioConfig {
        name: " ".into(),
        allocations: AllocationConfig::new(),
        future_resources: Vec::new(),
    };
    assert!(scenario.validate().is_err());
}

#[test]
fn test_library_paths_from_yaml() {
    let paths: LibraryPaths =
        serde_yml::from_str("root: /data/library\ncategory_dirs:\n  cable: cables\n").unwrap();
    assert_eq!(
        paths.path_for(&PoolKey::new("cable", "export")),
        std::path::PathBuf::from("/data/library/cables/export.yaml")
    );
    assert_eq!(
        paths.path_for(&PoolKey::new("port", "salem")),
        std::path::PathBuf::from("/data/library/salem.yaml")
    );
}
