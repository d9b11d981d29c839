//! Test utilities for mockprep
//!
//! Temporary directories, file fixtures, configuration builders, and
//! error assertions shared by unit tests.

use crate::config::{Config, GenerationConfig, StoreBackend, StoreConfig};
use crate::error::MockprepError;
use std::path::PathBuf;
use tempfile::TempDir;

/// A key that passes format classification
pub const TEST_API_KEY: &str = "AIzaSyTestKeyForUnitTests000000000";

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T, MockprepError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Generation settings pointed at `api_base` with a valid-looking key and
/// no retry delay
pub fn test_generation_config(api_base: &str) -> GenerationConfig {
    GenerationConfig {
        api_base: api_base.to_string(),
        api_key: Some(TEST_API_KEY.to_string()),
        retry_delay_ms: 0,
        ..GenerationConfig::default()
    }
}

/// Store settings for a SQLite file inside `dir`
pub fn sqlite_store_config(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        backend: StoreBackend::Sqlite,
        sqlite_path: Some(dir.path().join("sessions.db")),
        ..StoreConfig::default()
    }
}

/// Full configuration backed by SQLite inside `dir`
pub fn test_config(dir: &TempDir) -> Config {
    Config {
        generation: GenerationConfig::default(),
        store: sqlite_store_config(dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<(), MockprepError> =
            Err(MockprepError::Storage("duplicate key".to_string()));
        assert_error_contains(result, "duplicate");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<(), MockprepError> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_test_config_validates() {
        let dir = temp_dir();
        let config = test_config(&dir);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generation_config_key_is_well_formed() {
        let config = test_generation_config("http://127.0.0.1:1");
        assert_eq!(
            crate::providers::ApiKeyStatus::classify(config.api_key.as_deref()),
            crate::providers::ApiKeyStatus::Configured
        );
    }
}
