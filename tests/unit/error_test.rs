//! Tests for error types

use coral::core::{CoralError, PoolKey};

#[test]
fn test_unknown_resource_error() {
    let err = CoralError::unknown(&PoolKey::new("port", "salem"));
    assert_eq!(format!("{}", err), "unknown shared resource `port:salem`");
    assert!(err.is_config());
}

#[test]
fn test_invalid_config_error() {
    let err = CoralError::InvalidConfig("no projects".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: no projects");
    assert!(err.is_config());
}

#[test]
fn test_negative_delay_error() {
    let err = CoralError::NegativeDelay {
        category: "wtiv".into(),
        name: "example_wtiv".into(),
        delay: 24.0,
    };
    assert!(format!("{}", err).contains("24h before the run start"));
    assert!(err.is_config());
}

#[test]
fn test_executor_error_is_not_config() {
    let err = CoralError::Executor {
        project: "farm".into(),
        message: "diverged".into(),
    };
    assert_eq!(format!("{}", err), "project `farm` failed: diverged");
    assert!(!err.is_config());
}

#[test]
fn test_error_converts_to_anyhow() {
    let err: anyhow::Error = CoralError::Runtime("join failed".into()).into();
    assert!(err.to_string().contains("join failed"));
}
