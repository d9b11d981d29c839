//! SQLite table backend for local development and offline use

use crate::error::{MockprepError, Result};
use crate::storage::types::{parse_timestamp, SessionRow, SessionUpsert};
use crate::storage::SessionTable;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Session table stored in a local SQLite file
pub struct SqliteTable {
    db_path: PathBuf,
    table: String,
}

impl SqliteTable {
    /// Open the table at the default location in the user's data directory
    pub fn new(table: &str) -> Result<Self> {
        let proj_dirs = ProjectDirs::from("dev", "mockprep", "mockprep")
            .ok_or_else(|| MockprepError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("sessions.db"), table)
    }

    /// Open (and create if needed) the table in the given database file
    ///
    /// # Examples
    ///
    /// ```
    /// use mockprep::storage::SqliteTable;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let table = SqliteTable::new_with_path(dir.path().join("s.db"), "interview_sessions");
    /// assert!(table.is_ok());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P, table: &str) -> Result<Self> {
        if !is_identifier(table) {
            return Err(MockprepError::Config(format!("Invalid table name: {}", table)).into());
        }

        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| MockprepError::Storage(format!("{:#}", e)))?;
        }

        let storage = Self {
            db_path,
            table: table.to_string(),
        };
        storage.init()?;
        Ok(storage)
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| MockprepError::Storage(format!("{:#}", e)).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    user_id TEXT,
                    questions JSON NOT NULL,
                    created_at TEXT NOT NULL
                )",
                self.table
            ),
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| MockprepError::Storage(format!("{:#}", e)))?;
        Ok(())
    }
}

/// Letters, digits and underscores only, not starting with a digit
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn decode_row(
    id: String,
    user_id: Option<String>,
    questions_json: String,
    created_at: String,
) -> SessionRow {
    let questions = serde_json::from_str(&questions_json).ok();
    let created_at = parse_timestamp(&created_at);
    SessionRow {
        id,
        user_id,
        questions,
        created_at,
    }
}

#[async_trait]
impl SessionTable for SqliteTable {
    async fn select_by_id(&self, id: &str) -> Result<Option<SessionRow>> {
        let conn = self.open()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT id, user_id, questions, created_at FROM {} WHERE id = ?",
                    self.table
                ),
                params![id],
                |row| Ok(decode_row(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .context("Failed to query session")
            .map_err(|e| MockprepError::Storage(format!("{:#}", e)))?;
        Ok(row)
    }

    async fn select_by_user(&self, user_id: &str) -> Result<Vec<SessionRow>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, user_id, questions, created_at FROM {}
                WHERE user_id = ?
                ORDER BY created_at DESC, rowid DESC",
                self.table
            ))
            .context("Failed to prepare statement")
            .map_err(|e| MockprepError::Storage(format!("{:#}", e)))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(decode_row(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .context("Failed to query sessions")
            .map_err(|e| MockprepError::Storage(format!("{:#}", e)))?;

        let sessions: Vec<SessionRow> = rows.flatten().collect();
        Ok(sessions)
    }

    async fn upsert(&self, row: &SessionUpsert) -> Result<()> {
        let questions_json = serde_json::to_string(&row.questions)
            .context("Failed to serialize questions")
            .map_err(|e| MockprepError::Storage(format!("{:#}", e)))?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let conn = self.open()?;
        conn.execute(
            &format!(
                "INSERT INTO {table} (id, user_id, questions, created_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    questions = excluded.questions,
                    user_id = COALESCE(excluded.user_id, {table}.user_id)",
                table = self.table
            ),
            params![row.id, row.user_id, questions_json, now],
        )
        .context("Failed to upsert session")
        .map_err(|e| MockprepError::Storage(format!("{:#}", e)))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
