//! Configuration management for mockprep
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MockprepError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the generation API key
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Store URL variables, in order of precedence (backend naming first)
pub const STORE_URL_VARS: [&str; 2] = ["SUPABASE_URL", "PUBLIC_SUPABASE_URL"];

/// Service-role key variable; preferred so backend writes bypass row-level security
pub const SERVICE_ROLE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Store key variables, in order of precedence
pub const STORE_KEY_VARS: [&str; 3] = [
    SERVICE_ROLE_KEY_VAR,
    "SUPABASE_KEY",
    "PUBLIC_SUPABASE_ANON_KEY",
];

/// Hard execution deadline imposed by the hosting platform, in seconds
///
/// Per-request timeouts must stay strictly below this value.
pub const PLATFORM_DEADLINE_SECONDS: u64 = 10;

/// Main configuration structure for mockprep
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Generation API settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Session store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Generation API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model used for `generateContent` calls
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (useful for tests and local mocks)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key; normally supplied through `GOOGLE_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum attempts per `generate` call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    9
}

fn default_max_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Which table backend the session store talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote PostgREST endpoint (Supabase)
    #[default]
    Postgrest,
    /// Local SQLite file
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = MockprepError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgrest" | "supabase" => Ok(Self::Postgrest),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(MockprepError::Config(format!(
                "Invalid store backend: {}. Must be one of: postgrest, sqlite",
                other
            ))),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: StoreBackend,

    /// PostgREST project URL
    #[serde(default)]
    pub url: Option<String>,

    /// PostgREST key (service-role or anon)
    #[serde(default, skip_serializing)]
    pub key: Option<String>,

    /// Whether `key` is a service-role key
    #[serde(default)]
    pub service_role: bool,

    /// Table holding session rows
    #[serde(default = "default_table")]
    pub table: String,

    /// SQLite database file; defaults to the user data directory
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
}

fn default_table() -> String {
    "interview_sessions".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            key: None,
            service_role: false,
            table: default_table(),
            sqlite_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MockprepError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MockprepError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply environment overrides using the given variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(GOOGLE_API_KEY_VAR) {
            self.generation.api_key = Some(key);
        }

        if let Some(model) = get("MOCKPREP_MODEL") {
            self.generation.model = model;
        }

        if let Some(api_base) = get("MOCKPREP_API_BASE") {
            self.generation.api_base = api_base;
        }

        if let Some(timeout) = get("MOCKPREP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.generation.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MOCKPREP_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Some(attempts) = get("MOCKPREP_MAX_ATTEMPTS") {
            if let Ok(value) = attempts.parse() {
                self.generation.max_attempts = value;
            } else {
                tracing::warn!("Invalid MOCKPREP_MAX_ATTEMPTS: {}", attempts);
            }
        }

        if let Some(url) = STORE_URL_VARS.iter().find_map(|name| get(name)) {
            self.store.url = Some(url);
        }

        if let Some((name, key)) = STORE_KEY_VARS
            .iter()
            .find_map(|name| get(name).map(|key| (*name, key)))
        {
            self.store.service_role = name == SERVICE_ROLE_KEY_VAR;
            self.store.key = Some(key);
        }

        if let Some(backend) = get("MOCKPREP_STORE_BACKEND") {
            match backend.parse() {
                Ok(value) => self.store.backend = value,
                Err(e) => tracing::warn!("Ignoring MOCKPREP_STORE_BACKEND: {}", e),
            }
        }

        if let Some(path) = get("MOCKPREP_SQLITE_PATH") {
            self.store.sqlite_path = Some(PathBuf::from(path));
        }

        if let Some(table) = get("MOCKPREP_TABLE") {
            self.store.table = table;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(backend) = cli.backend {
            tracing::debug!("Store backend overridden from CLI: {:?}", backend);
            self.store.backend = backend;
        }

        if let Some(path) = &cli.sqlite_path {
            self.store.sqlite_path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range
    pub fn validate(&self) -> Result<()> {
        if self.generation.model.trim().is_empty() {
            return Err(MockprepError::Config("generation.model cannot be empty".to_string()).into());
        }

        if self.generation.timeout_seconds == 0 {
            return Err(MockprepError::Config(
                "generation.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.generation.timeout_seconds >= PLATFORM_DEADLINE_SECONDS {
            return Err(MockprepError::Config(format!(
                "generation.timeout_seconds must be less than {}",
                PLATFORM_DEADLINE_SECONDS
            ))
            .into());
        }

        if self.generation.max_attempts == 0 || self.generation.max_attempts > 5 {
            return Err(MockprepError::Config(
                "generation.max_attempts must be between 1 and 5".to_string(),
            )
            .into());
        }

        if url::Url::parse(&self.generation.api_base).is_err() {
            return Err(MockprepError::Config(format!(
                "generation.api_base is not a valid URL: {}",
                self.generation.api_base
            ))
            .into());
        }

        if self.store.table.trim().is_empty() {
            return Err(MockprepError::Config("store.table cannot be empty".to_string()).into());
        }

        Ok(())
    }
}
