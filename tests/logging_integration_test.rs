//! Integration tests for logging functionality
//!
//! The global subscriber can be installed once per process, so only one
//! test in this binary initializes logging successfully.

use formbridge::config::LoggingConfig;
use formbridge::logging::init_logging;
use formbridge::{log_step_complete, log_step_start};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "./logs");
}

#[test]
fn test_invalid_level_is_rejected_before_install() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("never");
    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "daily".to_string(),
    };

    assert!(init_logging("chatty", &config).is_err());
    assert!(!log_path.exists());
}

#[test]
fn test_file_logging_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");
    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "hourly".to_string(),
    };

    let guard = init_logging("debug", &config).unwrap();
    assert_eq!(guard.log_dir(), Some(log_path.as_path()));
    log_step_start!("intake");
    log_step_complete!("intake", 2, Duration::from_millis(15));
    drop(guard);

    assert!(log_path.is_dir());
    let written = std::fs::read_dir(&log_path)
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("formbridge.log"));
    assert!(written);
}
