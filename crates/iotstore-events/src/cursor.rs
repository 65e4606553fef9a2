//! Opaque keyset pagination cursor.
//!
//! A cursor records the `(recorded_at, id)` position of the last event in a
//! page. On the wire it is base64 over a JSON object:
//!
//! ```text
//! {"eventID": 4, "timestamp": "2018-05-01T09:00:00Z"}
//! ```
//!
//! Encoding uses the URL-safe alphabet with padding. Decoding also accepts
//! the standard alphabet, which earlier releases produced, so clients holding
//! a cursor across an upgrade keep paging.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use chrono::{DateTime, Utc};
use iotstore_core::time::is_storable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a cursor string was rejected.
#[derive(Debug, Error)]
pub enum CursorError {
    /// The cursor string was empty.
    #[error("cursor is empty")]
    Empty,

    /// Not valid base64 in either accepted alphabet.
    #[error("cursor is not valid base64: {0}")]
    Base64(String),

    /// Decoded bytes are not a cursor object (bad JSON or missing fields).
    #[error("cursor payload is malformed: {0}")]
    Json(#[source] serde_json::Error),

    /// The timestamp lies outside the range the store can order.
    #[error("cursor timestamp {0} is out of range")]
    OutOfRange(DateTime<Utc>),
}

/// Resume position for a paginated read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Id of the last event already returned.
    #[serde(rename = "eventID")]
    pub event_id: i64,
    /// `recorded_at` of that same event.
    pub timestamp: DateTime<Utc>,
}

impl Cursor {
    /// Cursor pointing just past the given event.
    pub fn new(event_id: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id,
            timestamp,
        }
    }

    /// Serialize to the opaque wire token.
    pub fn encode(&self) -> Result<String, CursorError> {
        let json = serde_json::to_vec(self).map_err(CursorError::Json)?;
        Ok(URL_SAFE.encode(json))
    }

    /// Parse a wire token. Never yields a default cursor for bad input.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        if token.is_empty() {
            return Err(CursorError::Empty);
        }

        let bytes = URL_SAFE
            .decode(token)
            .or_else(|_| STANDARD.decode(token))
            .map_err(|e| CursorError::Base64(e.to_string()))?;

        let cursor: Self = serde_json::from_slice(&bytes).map_err(CursorError::Json)?;
        if !is_storable(&cursor.timestamp) {
            return Err(CursorError::OutOfRange(cursor.timestamp));
        }
        Ok(cursor)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
