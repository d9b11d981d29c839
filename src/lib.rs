//! mockprep - AI interview practice backend library
//!
//! This library provides the server-side pieces of an interview practice
//! tool: a resilient client for a hosted generative model, an answer
//! evaluator built on it, and a session store that keeps practice history
//! and difficulty in a remote PostgREST table or a local SQLite file.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `providers`: Generative model client, key classification, and model listing
//! - `evaluator`: Interviewer prompt and tolerant parsing of model replies
//! - `storage`: Session store facade and its PostgREST and SQLite backends
//! - `config`: Configuration loading (file, environment, CLI) and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers behind the CLI commands
//!
//! # Example
//!
//! ```no_run
//! use mockprep::{Config, Evaluator, SessionStore};
//! use mockprep::providers::create_generator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let evaluator = Evaluator::new(create_generator(&config.generation)?);
//!     let result = evaluator.evaluate("What is a heap?", "A tree").await;
//!     println!("{}: {}", result.score, result.feedback);
//!
//!     let store = SessionStore::connect(&config.store);
//!     let _ = store.get_session("session-1").await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{MockprepError, Result};
pub use evaluator::{Evaluation, Evaluator};
pub use providers::{ApiKeyStatus, GeminiClient, TextGenerator};
pub use storage::{HistoryItem, SessionStore};

#[cfg(test)]
pub mod test_utils;
