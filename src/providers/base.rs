//! Base generator trait and common types for mockprep
//!
//! This module defines the `TextGenerator` trait that the evaluator depends
//! on, the credential status diagnostic, and model metadata returned by the
//! capability check.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation method a model must support to be usable for evaluation
pub const GENERATE_CONTENT_METHOD: &str = "generateContent";

/// Diagnostic state of the configured API key
///
/// Only `NotSet` affects control flow (the client never touches the network).
/// Every other state is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    /// No key configured; the client is disabled
    NotSet,
    /// Key present but does not look like a Google API key
    InvalidFormat,
    /// Key present and well-formed, not yet used
    Configured,
    /// Key accepted by the remote service
    Valid,
    /// Key or request rejected by the remote service (400/401/403)
    Invalid,
}

impl ApiKeyStatus {
    /// Classify a raw key as it is read from the environment
    ///
    /// # Examples
    ///
    /// ```
    /// use mockprep::providers::ApiKeyStatus;
    ///
    /// assert_eq!(ApiKeyStatus::classify(None), ApiKeyStatus::NotSet);
    /// assert_eq!(ApiKeyStatus::classify(Some("short")), ApiKeyStatus::InvalidFormat);
    /// assert_eq!(
    ///     ApiKeyStatus::classify(Some("AIzaSyA1234567890abcdefghij")),
    ///     ApiKeyStatus::Configured
    /// );
    /// ```
    pub fn classify(key: Option<&str>) -> Self {
        match key {
            None => Self::NotSet,
            Some(k) if k.len() < 20 || !k.starts_with("AIza") => Self::InvalidFormat,
            Some(_) => Self::Configured,
        }
    }

    /// Returns the snake_case label used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSet => "not_set",
            Self::InvalidFormat => "invalid_format",
            Self::Configured => "configured",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for ApiKeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model metadata returned by the models listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-1.5-flash`
    pub name: String,
    /// Human readable name
    #[serde(default)]
    pub display_name: String,
    /// Generation methods the model accepts
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Create a new ModelInfo instance
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            supported_generation_methods: Vec::new(),
        }
    }

    /// Set the supported generation methods
    pub fn with_methods(mut self, methods: &[&str]) -> Self {
        self.supported_generation_methods = methods.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Whether this model can serve `generateContent` requests
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_CONTENT_METHOD)
    }

    /// Model id without the `models/` resource prefix
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }
}

/// Text generation seam used by the evaluator
///
/// Implementations never fail loudly: an unusable backend, a rejected
/// request or an unexpected response all collapse to `None`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for the prompt, or `None` when generation is unavailable
    async fn generate(&self, prompt: &str) -> Option<String>;

    /// Whether the generator can issue requests at all
    fn is_enabled(&self) -> bool {
        true
    }
}
