//! Provider module for mockprep
//!
//! This module contains the text generation abstraction and the Gemini
//! implementation.

pub mod base;
pub mod gemini;

pub use base::{ApiKeyStatus, ModelInfo, TextGenerator, GENERATE_CONTENT_METHOD};
pub use gemini::GeminiClient;

use crate::config::GenerationConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the configured generator as a shared trait object
///
/// # Errors
///
/// Returns error if the HTTP client cannot be initialized
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>> {
    Ok(Arc::new(GeminiClient::new(config.clone())?))
}
