//! Command-line interface definition for mockprep
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for model probing, answer evaluation, and session
//! management.

use crate::config::StoreBackend;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mockprep - AI interview practice backend
///
/// Evaluate interview answers with a generative model and keep practice
/// sessions in a Supabase table or a local SQLite file.
#[derive(Parser, Debug, Clone)]
#[command(name = "mockprep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the session store backend (postgrest, sqlite)
    #[arg(long, global = true)]
    pub backend: Option<StoreBackend>,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    pub sqlite_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for mockprep
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List models available to the configured API key
    Models {
        /// Show every model, not only those supporting generateContent
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a candidate answer
    Evaluate {
        /// Interview question
        #[arg(short, long)]
        question: String,

        /// Candidate answer
        #[arg(short, long)]
        answer: String,

        /// Append the exchange to this session
        #[arg(short, long)]
        session: Option<String>,

        /// Topic label recorded with the exchange
        #[arg(short, long)]
        topic: Option<String>,

        /// Owner recorded when the session is written
        #[arg(short, long)]
        user: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect and edit stored sessions
    Session {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Show a session's difficulty and history
    Show {
        /// Session identifier
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a user's sessions, newest first
    List {
        /// User identifier
        #[arg(short, long)]
        user: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a session from a JSON file of history items
    Save {
        /// Session identifier
        id: String,

        /// Difficulty level to record
        #[arg(short, long)]
        difficulty: String,

        /// JSON file holding an array of history items
        #[arg(short, long)]
        items: PathBuf,

        /// Owner of the session
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Change a session's difficulty, keeping its history
    SetDifficulty {
        /// Session identifier
        id: String,

        /// New difficulty level
        difficulty: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            backend: None,
            sqlite_path: None,
            command: Commands::Models {
                all: false,
                json: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(cli.backend.is_none());
        assert!(matches!(
            cli.command,
            Commands::Models {
                all: false,
                json: false
            }
        ));
    }

    #[test]
    fn test_cli_parse_models() {
        let cli = Cli::try_parse_from(["mockprep", "models", "--all", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Models {
                all: true,
                json: true
            }
        ));
    }

    #[test]
    fn test_cli_parse_evaluate() {
        let cli = Cli::try_parse_from([
            "mockprep",
            "evaluate",
            "-q",
            "What is a B-tree?",
            "-a",
            "A balanced tree",
            "--session",
            "s1",
        ])
        .unwrap();
        if let Commands::Evaluate {
            question,
            answer,
            session,
            topic,
            user,
            json,
        } = cli.command
        {
            assert_eq!(question, "What is a B-tree?");
            assert_eq!(answer, "A balanced tree");
            assert_eq!(session.as_deref(), Some("s1"));
            assert!(topic.is_none());
            assert!(user.is_none());
            assert!(!json);
        } else {
            panic!("Expected Evaluate command");
        }
    }

    #[test]
    fn test_cli_evaluate_requires_answer() {
        assert!(Cli::try_parse_from(["mockprep", "evaluate", "-q", "Q"]).is_err());
    }

    #[test]
    fn test_cli_parse_session_list() {
        let cli = Cli::try_parse_from(["mockprep", "session", "list", "--user", "u1"]).unwrap();
        if let Commands::Session {
            command: SessionCommand::List { user, json },
        } = cli.command
        {
            assert_eq!(user, "u1");
            assert!(!json);
        } else {
            panic!("Expected Session List command");
        }
    }

    #[test]
    fn test_cli_parse_set_difficulty() {
        let cli =
            Cli::try_parse_from(["mockprep", "session", "set-difficulty", "s1", "Hard"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Session {
                command: SessionCommand::SetDifficulty { .. }
            }
        ));
    }

    #[test]
    fn test_cli_parse_backend_override() {
        let cli = Cli::try_parse_from([
            "mockprep",
            "session",
            "show",
            "s1",
            "--backend",
            "sqlite",
            "--sqlite-path",
            "/tmp/s.db",
        ])
        .unwrap();
        assert_eq!(cli.backend, Some(StoreBackend::Sqlite));
        assert_eq!(cli.sqlite_path, Some(PathBuf::from("/tmp/s.db")));
    }

    #[test]
    fn test_cli_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["mockprep", "--backend", "mongo", "models"]).is_err());
    }
}
