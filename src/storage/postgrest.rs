//! PostgREST (Supabase) table backend
//!
//! Maps the three session table operations onto the PostgREST HTTP
//! dialect: filters as `column=eq.value` query parameters, ordering via
//! `order=column.desc`, and upserts as a POST with
//! `Prefer: resolution=merge-duplicates`.

use crate::error::{MockprepError, Result};
use crate::storage::types::{SessionRow, SessionUpsert};
use crate::storage::SessionTable;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 9;

/// Session table served by a PostgREST endpoint
pub struct PostgrestTable {
    client: Client,
    table_url: Url,
}

impl PostgrestTable {
    /// Build a client for `{base_url}/rest/v1/{table}`
    ///
    /// Every request carries the key both as `apikey` and as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is malformed, the key is not a valid header
    /// value, or the HTTP client cannot be built.
    pub fn new(base_url: &str, key: &str, table: &str) -> Result<Self> {
        let raw = format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table);
        let table_url = Url::parse(&raw)
            .map_err(|e| MockprepError::Config(format!("Invalid store URL {}: {}", base_url, e)))?;

        let mut headers = HeaderMap::new();
        let apikey = HeaderValue::from_str(key)
            .map_err(|_| MockprepError::Config("Store key is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| MockprepError::Config("Store key is not a valid header value".into()))?;
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("mockprep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MockprepError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, table_url })
    }

    /// Fully qualified table endpoint
    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    async fn rows(response: Response, operation: &str) -> Result<Vec<SessionRow>> {
        let response = Self::check(response, operation).await?;
        response.json().await.map_err(|e| {
            MockprepError::Storage(format!("Failed to decode {} response: {}", operation, e)).into()
        })
    }

    async fn check(response: Response, operation: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(MockprepError::Storage(format!(
            "{} failed with status {}: {}",
            operation,
            status.as_u16(),
            body
        ))
        .into())
    }

    fn send_error(operation: &str, e: reqwest::Error) -> anyhow::Error {
        MockprepError::Storage(format!("{} request failed: {}", operation, e)).into()
    }
}

#[async_trait]
impl SessionTable for PostgrestTable {
    async fn select_by_id(&self, id: &str) -> Result<Option<SessionRow>> {
        let response = self
            .client
            .get(self.table_url.clone())
            .query(&[("select", "questions".to_string()), ("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| Self::send_error("select_by_id", e))?;

        let rows = Self::rows(response, "select_by_id").await?;
        Ok(rows.into_iter().next().map(|mut row| {
            if row.id.is_empty() {
                row.id = id.to_string();
            }
            row
        }))
    }

    async fn select_by_user(&self, user_id: &str) -> Result<Vec<SessionRow>> {
        let response = self
            .client
            .get(self.table_url.clone())
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Self::send_error("select_by_user", e))?;

        Self::rows(response, "select_by_user").await
    }

    async fn upsert(&self, row: &SessionUpsert) -> Result<()> {
        let response = self
            .client
            .post(self.table_url.clone())
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await
            .map_err(|e| Self::send_error("upsert", e))?;

        Self::check(response, "upsert").await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }
}
