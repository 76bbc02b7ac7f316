//! Test utilities for sweeparr
//!
//! Temporary directories, file fixtures, and error assertions shared by the
//! unit tests.

use crate::config::{Config, SeriesSettings};
use crate::error::Result;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// The directory is removed when the returned value is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content and return its path
///
/// # Panics
///
/// Panics if the file cannot be written
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that `result` failed with a message containing `expected`
///
/// The whole context chain is searched.
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Config with the given global grace period and per-series overrides
pub fn test_config(grace_days: i64, overrides: &[(&str, Option<i64>)]) -> Config {
    let mut config = Config {
        grace_days: Some(grace_days),
        ..Config::default()
    };
    for (series, days) in overrides {
        config
            .series_settings
            .insert(*series, SeriesSettings { grace_days: *days });
    }
    config
}

/// Sample policy document in JSON form
pub fn test_config_json() -> String {
    r#"{
  "sonarr": {"url": "http://sonarr.local:8989/", "api_key": "secret"},
  "unmonitor_after_delete": false,
  "grace_days": 3,
  "series_settings": {
    "Foo": {"grace_days": 0},
    "Bar Baz": {"grace_days": 7}
  }
}"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SweeparrError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "hello");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(SweeparrError::Storage("disk full".to_string()).into());
        assert_error_contains(result, "disk full");
    }

    #[test]
    #[should_panic(expected = "but got Ok")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "anything");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: Result<()> = Err(SweeparrError::Storage("disk full".to_string()).into());
        assert_error_contains(result, "network");
    }

    #[test]
    fn test_test_config_overrides_keep_order() {
        let config = test_config(2, &[("B", Some(0)), ("A", None)]);
        let keys: Vec<&str> = config.series_settings.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(config.grace_days, Some(2));
    }

    #[test]
    fn test_test_config_json_parses() {
        let config = Config::from_json(&test_config_json()).unwrap();
        assert_eq!(config.grace_days, Some(3));
        assert!(!config.unmonitor_after_delete);
        assert_eq!(config.series_settings.len(), 2);
    }
}
