//! Session store adapter
//!
//! Persists interview sessions as rows of `(id, user_id, questions,
//! created_at)`. The difficulty level rides inside `questions` as a marker
//! item (see [`types::HistoryItem`]). The adapter owns an explicit
//! connection state; once disabled it stays disabled for the life of the
//! value.
//!
//! Concurrent `update_session` calls for the same id are last-write-wins:
//! there is no versioning or locking between the marker rewrite and the
//! upsert.

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{MockprepError, Result};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub mod postgrest;
pub mod sqlite;
pub mod types;

pub use postgrest::PostgrestTable;
pub use sqlite::SqliteTable;
pub use types::{
    find_difficulty, session_topic, visible_question_count, with_difficulty, HistoryItem,
    SessionRow, SessionState, SessionSummary, SessionUpsert, DEFAULT_DIFFICULTY, DEFAULT_TOPIC,
};

/// Message returned by every operation on a store that is not connected
pub const NOT_CONNECTED: &str = "Session store not connected. Check SUPABASE_URL/KEY.";

/// The three row operations a session backend must provide
#[async_trait]
pub trait SessionTable: Send + Sync {
    /// Fetch one row by session id
    async fn select_by_id(&self, id: &str) -> Result<Option<SessionRow>>;

    /// Fetch a user's rows, newest `created_at` first
    async fn select_by_user(&self, user_id: &str) -> Result<Vec<SessionRow>>;

    /// Insert or replace the row keyed by `row.id`
    ///
    /// Must not overwrite `created_at` of an existing row, and must keep the
    /// existing `user_id` when `row.user_id` is `None`.
    async fn upsert(&self, row: &SessionUpsert) -> Result<()>;

    /// Short backend label for logs
    fn backend_name(&self) -> &'static str;
}

/// Lifecycle of the store connection
///
/// `Uninitialized` moves exactly once, to `Connected` or `Disabled`.
pub enum ConnectionState {
    /// `init` has not run yet
    Uninitialized,
    /// Backend opened successfully
    Connected(Arc<dyn SessionTable>),
    /// Credentials missing or connect failed; permanent
    Disabled(String),
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Connected(table) => write!(f, "Connected({})", table.backend_name()),
            Self::Disabled(reason) => write!(f, "Disabled({})", reason),
        }
    }
}

/// Session store adapter
///
/// # Examples
///
/// ```no_run
/// use mockprep::config::StoreConfig;
/// use mockprep::storage::SessionStore;
///
/// # async fn example() {
/// let store = SessionStore::connect(&StoreConfig::default());
/// if let Some(state) = store.get_session("session-1").await {
///     println!("difficulty: {}", state.difficulty);
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct SessionStore {
    state: ConnectionState,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an uninitialized store; every operation fails until `init`
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Uninitialized,
        }
    }

    /// Create and initialize a store from configuration
    pub fn connect(config: &StoreConfig) -> Self {
        let mut store = Self::new();
        store.init(config);
        store
    }

    /// Create a store already connected to the given backend
    pub fn with_table(table: Arc<dyn SessionTable>) -> Self {
        Self {
            state: ConnectionState::Connected(table),
        }
    }

    /// Open the configured backend
    ///
    /// Runs only from `Uninitialized`; later calls are ignored so a disabled
    /// store never comes back.
    pub fn init(&mut self, config: &StoreConfig) {
        if !matches!(self.state, ConnectionState::Uninitialized) {
            tracing::warn!("Session store already initialized: {:?}", self.state);
            return;
        }

        self.state = match open_table(config) {
            Ok(table) => {
                tracing::info!("Connected to session store ({})", table.backend_name());
                ConnectionState::Connected(table)
            }
            Err(e) => {
                tracing::warn!("Session store disabled: {:#}", e);
                ConnectionState::Disabled(e.to_string())
            }
        };
    }

    /// Current connection state
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Whether operations can reach a backend
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    fn table(&self) -> std::result::Result<&Arc<dyn SessionTable>, MockprepError> {
        match &self.state {
            ConnectionState::Connected(table) => Ok(table),
            ConnectionState::Uninitialized => {
                Err(MockprepError::StoreUnavailable(NOT_CONNECTED.to_string()))
            }
            ConnectionState::Disabled(reason) => Err(MockprepError::StoreUnavailable(format!(
                "{} ({})",
                NOT_CONNECTED, reason
            ))),
        }
    }

    /// Look up a session's difficulty and items
    ///
    /// Items are returned as stored, marker included. Returns `None` when the
    /// session does not exist or the store cannot be reached; failures are
    /// logged.
    pub async fn get_session(&self, id: &str) -> Option<SessionState> {
        match self.load_session(id).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("DB Error (get_session): {}", e);
                None
            }
        }
    }

    /// Like [`get_session`](Self::get_session), but keeps "not found"
    /// (`Ok(None)`) apart from a failed read
    ///
    /// Read-modify-write callers must use this so that a failed read never
    /// turns into an overwrite with an empty history.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` when not connected, or `Storage` when the
    /// backend read fails.
    pub async fn load_session(
        &self,
        id: &str,
    ) -> std::result::Result<Option<SessionState>, MockprepError> {
        let table = self.table()?;

        match table.select_by_id(id).await {
            Ok(Some(row)) => {
                let items = row.items();
                Ok(Some(SessionState {
                    difficulty: find_difficulty(&items),
                    items,
                }))
            }
            Ok(None) => {
                tracing::debug!("Session {} not found", id);
                Ok(None)
            }
            Err(e) => Err(into_store_error(e)),
        }
    }

    /// Summaries of a user's sessions, newest first
    ///
    /// Returns an empty list on any failure.
    pub async fn get_user_sessions(&self, user_id: &str) -> Vec<SessionSummary> {
        let table = match self.table() {
            Ok(table) => table,
            Err(e) => {
                tracing::error!("DB Error (get_user_sessions): {}", e);
                return Vec::new();
            }
        };

        match table.select_by_user(user_id).await {
            Ok(rows) => rows.iter().map(SessionSummary::from).collect(),
            Err(e) => {
                tracing::warn!("DB Error (get_user_sessions): {:#}", e);
                Vec::new()
            }
        }
    }

    /// Replace a session's items, stamping the given difficulty
    ///
    /// All existing markers are dropped and a single fresh one is appended
    /// before the upsert. `user_id` is only written when provided.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` when not connected, or `Storage` with the
    /// backend's message when the write fails. Writes are not retried.
    pub async fn update_session(
        &self,
        id: &str,
        difficulty: &str,
        items: Vec<HistoryItem>,
        user_id: Option<&str>,
    ) -> std::result::Result<(), MockprepError> {
        let table = self.table().map_err(|e| {
            tracing::error!("DB Error (update_session): {}", e);
            e
        })?;

        let row = SessionUpsert {
            id: id.to_string(),
            questions: with_difficulty(items, difficulty),
            user_id: user_id.map(String::from),
        };

        table.upsert(&row).await.map_err(|e| {
            tracing::warn!("DB Error (update_session): {:#}", e);
            into_store_error(e)
        })
    }
}

fn into_store_error(e: anyhow::Error) -> MockprepError {
    match e.downcast::<MockprepError>() {
        Ok(err) => err,
        Err(other) => MockprepError::Storage(format!("{:#}", other)),
    }
}

/// Build the backend selected by configuration
fn open_table(config: &StoreConfig) -> Result<Arc<dyn SessionTable>> {
    match config.backend {
        StoreBackend::Postgrest => {
            let (url, key) = match (&config.url, &config.key) {
                (Some(url), Some(key)) => (url, key),
                _ => {
                    return Err(MockprepError::MissingCredentials(
                        "session store (set SUPABASE_URL and SUPABASE_KEY)".to_string(),
                    )
                    .into())
                }
            };

            if !config.service_role {
                tracing::warn!(
                    "SUPABASE_SERVICE_ROLE_KEY not set. Writes may fail due to row-level security."
                );
            }

            Ok(Arc::new(PostgrestTable::new(url, key, &config.table)?))
        }
        StoreBackend::Sqlite => {
            let table = match &config.sqlite_path {
                Some(path) => SqliteTable::new_with_path(path.clone(), &config.table)?,
                None => SqliteTable::new(&config.table)?,
            };
            tracing::debug!("Using SQLite session store at {}", table.path().display());
            Ok(Arc::new(table))
        }
    }
}
