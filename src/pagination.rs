use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Composite pagination cursor: the `(created_at, id)` of the last item the
/// client has seen. The id component breaks timestamp ties so pages never
/// overlap even when rows share a second-resolution `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: NaiveDateTime,
    pub id: i64,
}

impl Cursor {
    pub fn new(created_at: NaiveDateTime, id: i64) -> Self {
        Cursor { created_at, id }
    }

    /// Opaque wire form: `<unix_seconds>_<id>`.
    pub fn encode(&self) -> String {
        format!("{}_{}", self.created_at.timestamp(), self.id)
    }

    pub fn decode(raw: &str) -> Result<Cursor, ApiError> {
        let (ts, id) = raw.split_once('_').ok_or(ApiError::BadCursor)?;
        let ts = ts.parse::<i64>().map_err(|_| ApiError::BadCursor)?;
        let id = id.parse::<i64>().map_err(|_| ApiError::BadCursor)?;
        let created_at = NaiveDateTime::from_timestamp_opt(ts, 0).ok_or(ApiError::BadCursor)?;
        Ok(Cursor { created_at, id })
    }

    /// Timestamp formatted the way SQLite's CURRENT_TIMESTAMP stores it, so
    /// TEXT comparison in the cursor predicate stays chronological.
    pub fn sql_timestamp(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub fn decode_opt(raw: &Option<String>) -> Result<Option<Cursor>, ApiError> {
    match raw {
        Some(raw) => Cursor::decode(raw).map(Some),
        None => Ok(None),
    }
}

/// One page of a cursor-paginated listing. `next_cursor` is `None` exactly
/// when the page came back shorter than the requested size.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn from_items(items: Vec<T>, limit: u32, cursor_of: impl Fn(&T) -> Cursor) -> Page<T> {
        let next_cursor = if (items.len() as u32) < limit {
            None
        } else {
            items.last().map(|item| cursor_of(item).encode())
        };
        Page { items, next_cursor }
    }
}
