//! Error types for mockprep
//!
//! This module defines the error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for mockprep operations
///
/// Covers configuration problems, generation API failures, and session
/// store failures. Public adapter operations surface these as values;
/// nothing in the crate panics on a remote failure.
#[derive(Error, Debug)]
pub enum MockprepError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generation API errors (HTTP status, unexpected response shape)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Missing credentials for a remote service
    #[error("Missing credentials for: {0}")]
    MissingCredentials(String),

    /// Authentication errors (e.g., 401 Unauthorized)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Session store errors (query, upsert, decode)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Session store was never connected or has been disabled
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for mockprep operations
///
/// Uses `anyhow::Error` so internals can attach context while the public
/// store surface converts failures into [`MockprepError`] values.
pub type Result<T> = anyhow::Result<T>;
