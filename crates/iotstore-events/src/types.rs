//! Domain types for stored events and paginated reads.

use chrono::{DateTime, Utc};

use crate::errors::{Result, StoreError};

/// Page size used when a reader asks for zero.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Largest page a reader may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// A stored event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Store-assigned, strictly increasing id.
    pub id: i64,
    /// Owner of the event (policy, community or public key).
    pub partition_key: String,
    /// Store-assigned write time.
    pub recorded_at: DateTime<Utc>,
    /// Opaque payload.
    pub data: Vec<u8>,
    /// Opaque token of the device that wrote the event.
    pub device_token: String,
}

/// Row to insert. `recorded_at` is a floor: the repository never stores a
/// time earlier than the newest event already in the same partition.
#[derive(Clone, Copy, Debug)]
pub struct NewEvent<'a> {
    /// Owner of the event.
    pub partition_key: &'a str,
    /// Opaque payload.
    pub data: &'a [u8],
    /// Device that wrote the event.
    pub device_token: &'a str,
    /// Proposed write time.
    pub recorded_at: DateTime<Utc>,
}

/// Parameters of a paginated read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadQuery {
    /// Partition to read.
    pub partition_key: String,
    /// Requested page size; 0 means [`DEFAULT_PAGE_SIZE`].
    pub page_size: u32,
    /// Inclusive lower bound on `recorded_at`.
    pub start_time: DateTime<Utc>,
    /// Exclusive upper bound on `recorded_at`. `None` or the zero timestamp
    /// leaves the range open.
    pub end_time: Option<DateTime<Utc>>,
    /// Token from a previous page. An empty string counts as absent.
    pub cursor: Option<String>,
}

/// One page of a paginated read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    /// Events in `(recorded_at, id)` order.
    pub events: Vec<Event>,
    /// Token for the next page; `None` once a short page proves exhaustion.
    pub next_cursor: Option<String>,
}

/// Apply the page size rules: 0 becomes [`DEFAULT_PAGE_SIZE`], anything
/// outside `1..=MAX_PAGE_SIZE` is rejected rather than clamped.
pub fn resolve_page_size(requested: i64) -> Result<u32> {
    match requested {
        0 => Ok(DEFAULT_PAGE_SIZE),
        n if n < 0 || n > i64::from(MAX_PAGE_SIZE) => Err(StoreError::validation(
            "page_size",
            format!("must be between 1 and {MAX_PAGE_SIZE}"),
        )),
        // In range, so the conversion cannot fail.
        n => u32::try_from(n).map_err(|e| StoreError::Internal(e.to_string())),
    }
}
