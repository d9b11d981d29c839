use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use mockprep::config::{GenerationConfig, StoreBackend, StoreConfig};
use mockprep::storage::SessionStore;

/// Key that classifies as well formed
#[allow(dead_code)]
pub const TEST_KEY: &str = "AIzaSyIntegrationTestKey0000000000";

/// Generation settings aimed at a mock server with no retry delay
#[allow(dead_code)]
pub fn generation_config(api_base: &str) -> GenerationConfig {
    GenerationConfig {
        api_base: api_base.to_string(),
        api_key: Some(TEST_KEY.to_string()),
        retry_delay_ms: 0,
        ..GenerationConfig::default()
    }
}

/// Store settings for a PostgREST endpoint at `url`
#[allow(dead_code)]
pub fn postgrest_config(url: &str) -> StoreConfig {
    StoreConfig {
        backend: StoreBackend::Postgrest,
        url: Some(url.to_string()),
        key: Some("service-role-key".to_string()),
        service_role: true,
        ..StoreConfig::default()
    }
}

/// A connected store over a fresh SQLite file
#[allow(dead_code)]
pub fn create_temp_store() -> (SessionStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SessionStore::connect(&StoreConfig {
        backend: StoreBackend::Sqlite,
        sqlite_path: Some(tmp.path().join("sessions.db")),
        ..StoreConfig::default()
    });
    assert!(store.is_connected(), "sqlite store failed to connect");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Wrap text in a `generateContent` success envelope
#[allow(dead_code)]
pub fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}
