//! Gemini provider implementation for mockprep
//!
//! This module talks to the Google Generative Language REST API
//! (`v1beta`). It issues `generateContent` requests with a bounded retry
//! loop and lists models for the capability check.

use crate::config::GenerationConfig;
use crate::error::{MockprepError, Result};
use crate::providers::{ApiKeyStatus, ModelInfo, TextGenerator};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;

/// Upper bound on followed `nextPageToken` links when listing models
const MAX_MODEL_PAGES: usize = 10;

/// Gemini REST client
///
/// A client built without an API key is permanently disabled: `generate`
/// returns `None` and never touches the network. A key that looks malformed
/// is still used, since the remote service has the final say.
///
/// # Examples
///
/// ```no_run
/// use mockprep::config::GenerationConfig;
/// use mockprep::providers::{GeminiClient, TextGenerator};
///
/// # async fn example() -> mockprep::error::Result<()> {
/// let config = GenerationConfig {
///     api_key: std::env::var("GOOGLE_API_KEY").ok(),
///     ..GenerationConfig::default()
/// };
/// let client = GeminiClient::new(config)?;
/// if let Some(text) = client.generate("Say hello").await {
///     println!("{}", text);
/// }
/// # Ok(())
/// # }
/// ```
pub struct GeminiClient {
    client: Client,
    config: GenerationConfig,
    status: RwLock<ApiKeyStatus>,
}

/// Request body for `generateContent`
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response envelope from `generateContent`
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

/// Response from the models listing endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// What a single attempt decided
#[derive(Debug, PartialEq)]
enum Attempt {
    /// Stop and return this result
    Done(Option<String>),
    /// Transient failure; try again if attempts remain
    Retry,
}

impl GeminiClient {
    /// Create a new Gemini client
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("mockprep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MockprepError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        let status = ApiKeyStatus::classify(config.api_key.as_deref());
        match status {
            ApiKeyStatus::NotSet => {
                tracing::warn!("GOOGLE_API_KEY not set - Gemini features will be disabled")
            }
            ApiKeyStatus::InvalidFormat => {
                tracing::warn!("GOOGLE_API_KEY format looks invalid (should start with 'AIza')")
            }
            _ => tracing::info!("Gemini client ready: model={}", config.model),
        }

        Ok(Self {
            client,
            config,
            status: RwLock::new(status),
        })
    }

    /// Current credential status
    pub fn status(&self) -> ApiKeyStatus {
        match self.status.read() {
            Ok(status) => *status,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_status(&self, status: ApiKeyStatus) {
        match self.status.write() {
            Ok(mut current) => *current = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }

    /// Configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base(),
            self.config.model
        )
    }

    /// Run one `generateContent` request and classify the outcome
    async fn attempt(&self, key: &str, body: &GenerateContentRequest<'_>) -> Attempt {
        let response = match self
            .client
            .post(self.generate_url())
            .query(&[("key", key)])
            .json(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Gemini request failed: {}", e.without_url());
                return Attempt::Retry;
            }
        };

        let status = response.status();
        match status {
            StatusCode::OK => {
                self.set_status(ApiKeyStatus::Valid);
                match response.text().await {
                    Ok(text) => Attempt::Done(extract_text(&text)),
                    Err(e) => {
                        tracing::warn!("Failed to read Gemini response body: {}", e.without_url());
                        Attempt::Retry
                    }
                }
            }
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!("Gemini rate limit or quota hit ({})", status.as_u16());
                Attempt::Retry
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let error_text = response.text().await.unwrap_or_default();
                tracing::error!("Gemini API error {}: {}", status.as_u16(), error_text);
                self.set_status(ApiKeyStatus::Invalid);
                Attempt::Done(None)
            }
            _ => {
                let error_text = response.text().await.unwrap_or_default();
                tracing::error!("Gemini API error {}: {}", status.as_u16(), error_text);
                Attempt::Retry
            }
        }
    }

    /// List every model visible to the configured key
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when no key is configured, and a
    /// provider error for non-200 responses or unparseable bodies.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| MockprepError::MissingCredentials("GOOGLE_API_KEY".to_string()))?;

        let url = format!("{}/v1beta/models", self.base());
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_MODEL_PAGES {
            let mut request = self.client.get(&url).query(&[("key", key)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.map_err(|e| {
                MockprepError::Provider(format!("Failed to list models: {}", e.without_url()))
            })?;

            let status = response.status();
            if status != StatusCode::OK {
                let error_text = response.text().await.unwrap_or_default();
                let message = format!("API Error {}: {}", status.as_u16(), error_text);
                if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                    self.set_status(ApiKeyStatus::Invalid);
                    return Err(MockprepError::Authentication(message).into());
                }
                return Err(MockprepError::Provider(message).into());
            }

            self.set_status(ApiKeyStatus::Valid);
            let page: ListModelsResponse = response.json().await.map_err(|e| {
                MockprepError::Provider(format!("Failed to parse models response: {}", e))
            })?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} models", models.len());
        Ok(models)
    }

    /// List only the models that support `generateContent`
    pub async fn generation_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self
            .list_models()
            .await?
            .into_iter()
            .filter(ModelInfo::supports_generation)
            .collect())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Option<String> {
        let key = self.config.api_key.as_deref()?;

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };
        let max_attempts = self.config.max_attempts.max(1);
        let delay = Duration::from_millis(self.config.retry_delay_ms);

        for attempt in 1..=max_attempts {
            tracing::debug!("Gemini generate attempt {}/{}", attempt, max_attempts);
            match self.attempt(key, &body).await {
                Attempt::Done(result) => return result,
                Attempt::Retry if attempt < max_attempts => {
                    tracing::debug!("Retrying in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                }
                Attempt::Retry => {}
            }
        }

        tracing::error!("Gemini generate gave up after {} attempts", max_attempts);
        None
    }

    fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body
///
/// Any structural mismatch is logged and yields `None`.
fn extract_text(body: &str) -> Option<String> {
    let parsed: GenerateContentResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("Unexpected API response format ({}): {}", e, body);
            return None;
        }
    };

    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text);

    if text.is_none() {
        tracing::error!("Unexpected API response format: {}", body);
    }
    text
}
