use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Difficulty reported when a session carries no marker
pub const DEFAULT_DIFFICULTY: &str = "Easy";

/// Topic reported when the first item carries no `topic` field
pub const DEFAULT_TOPIC: &str = "General Coding";

/// Reserved field that identifies a difficulty marker item
pub const MARKER_FIELD: &str = "meta";

/// Value of [`MARKER_FIELD`] on a difficulty marker item
pub const MARKER_TAG: &str = "difficulty";

/// One entry of a session's `questions` column
///
/// The backing table has no difficulty column, so the current difficulty
/// travels inside the list as a marker object
/// `{"meta": "difficulty", "value": <level>}`. Everything else is an
/// exchange record kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum HistoryItem {
    /// Free-form question/answer exchange
    Exchange(Value),
    /// Sentinel carrying the session difficulty
    DifficultyMarker(String),
}

impl HistoryItem {
    /// Build a difficulty marker
    pub fn marker(difficulty: impl Into<String>) -> Self {
        Self::DifficultyMarker(difficulty.into())
    }

    /// Whether this item is a difficulty marker
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::DifficultyMarker(_))
    }

    /// The `topic` field of an exchange record, if any
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Exchange(value) => value.get("topic").and_then(Value::as_str),
            Self::DifficultyMarker(_) => None,
        }
    }
}

impl From<Value> for HistoryItem {
    fn from(value: Value) -> Self {
        let is_marker = value
            .get(MARKER_FIELD)
            .and_then(Value::as_str)
            .is_some_and(|tag| tag == MARKER_TAG);

        if !is_marker {
            return Self::Exchange(value);
        }

        let difficulty = value
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_DIFFICULTY);
        Self::DifficultyMarker(difficulty.to_string())
    }
}

impl From<HistoryItem> for Value {
    fn from(item: HistoryItem) -> Self {
        match item {
            HistoryItem::Exchange(value) => value,
            HistoryItem::DifficultyMarker(difficulty) => {
                let mut map = Map::new();
                map.insert(MARKER_FIELD.to_string(), Value::from(MARKER_TAG));
                map.insert("value".to_string(), Value::from(difficulty));
                Value::Object(map)
            }
        }
    }
}

/// Difficulty carried by the first marker, or the default
pub fn find_difficulty(items: &[HistoryItem]) -> String {
    items
        .iter()
        .find_map(|item| match item {
            HistoryItem::DifficultyMarker(d) => Some(d.clone()),
            HistoryItem::Exchange(_) => None,
        })
        .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string())
}

/// Remove every marker and append exactly one carrying `difficulty`
///
/// Non-marker items keep their relative order.
pub fn with_difficulty(items: Vec<HistoryItem>, difficulty: &str) -> Vec<HistoryItem> {
    let mut cleaned: Vec<HistoryItem> = items.into_iter().filter(|i| !i.is_marker()).collect();
    cleaned.push(HistoryItem::marker(difficulty));
    cleaned
}

/// Topic label of a session: the first item's `topic`, or the default
pub fn session_topic(items: &[HistoryItem]) -> String {
    items
        .first()
        .and_then(HistoryItem::topic)
        .unwrap_or(DEFAULT_TOPIC)
        .to_string()
}

/// Number of questions shown to the user
///
/// The marker item is excluded by convention, so this is `len - 1`
/// floored at zero.
pub fn visible_question_count(items: &[HistoryItem]) -> usize {
    items.len().saturating_sub(1)
}

/// Decode the `questions` column, tolerating null or non-list values
pub fn items_from_value(value: Option<Value>) -> Vec<HistoryItem> {
    match value {
        Some(Value::Array(values)) => values.into_iter().map(HistoryItem::from).collect(),
        _ => Vec::new(),
    }
}

/// A raw row of the sessions table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRow {
    /// Opaque session identifier
    #[serde(default)]
    pub id: String,
    /// Owning user, if any
    #[serde(default)]
    pub user_id: Option<String>,
    /// Ordered history items (JSON list)
    #[serde(default)]
    pub questions: Option<Value>,
    /// Assigned by the store on first insert
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Parse a store timestamp
///
/// RFC 3339 values keep their offset. Offset-less values (a Postgres
/// `timestamp` column, or SQLite text) are read as UTC. Anything else is
/// `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let parsed = raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp);
    if parsed.is_none() && raw.as_ref().is_some_and(|v| !v.is_null()) {
        tracing::debug!("Unreadable created_at ignored: {:?}", raw);
    }
    Ok(parsed)
}

impl SessionRow {
    /// Decoded history items
    pub fn items(&self) -> Vec<HistoryItem> {
        items_from_value(self.questions.clone())
    }
}

/// The payload written by an upsert
///
/// `created_at` is deliberately absent; `user_id` is omitted when unset so
/// that an update never clears an existing owner.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpsert {
    /// Session identifier (conflict key)
    pub id: String,
    /// Items to store, marker included
    pub questions: Vec<HistoryItem>,
    /// Owner to set, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Difficulty and items recovered for a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    /// Current difficulty level
    pub difficulty: String,
    /// Items exactly as stored, marker included
    pub items: Vec<HistoryItem>,
}

impl SessionState {
    /// Items with markers removed
    pub fn exchanges(&self) -> Vec<&HistoryItem> {
        self.items.iter().filter(|i| !i.is_marker()).collect()
    }
}

/// Listing entry for a user's sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub session_id: String,
    /// Topic label derived from the first item
    pub topic: String,
    /// When the store created the session
    pub created_at: Option<DateTime<Utc>>,
    /// Visible question count (marker excluded)
    pub questions_count: usize,
    /// Current difficulty level
    pub difficulty: String,
}

impl From<&SessionRow> for SessionSummary {
    fn from(row: &SessionRow) -> Self {
        let items = row.items();
        Self {
            session_id: row.id.clone(),
            topic: session_topic(&items),
            created_at: row.created_at,
            questions_count: visible_question_count(&items),
            difficulty: find_difficulty(&items),
        }
    }
}
