/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `models`: list models available to the configured key
- `evaluate`: score an answer and optionally append it to a session
- `sessions`: show, list, save and re-grade stored sessions

Handlers are thin: they build a client or store from configuration and
format the result for the terminal.
*/

// Model listing
pub mod models;

// Answer evaluation
pub mod evaluate;

// Session management
pub mod sessions;

pub use evaluate::{run_evaluate, EvaluateArgs};
pub use models::list_models;
pub use sessions::handle_session;
