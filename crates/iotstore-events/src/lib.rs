//! # iotstore-events
//!
//! Append-only, time-ordered event storage with `SQLite` backend.
//!
//! - **Connection manager**: start/stop lifecycle of the `r2d2` pool and a
//!   real `SELECT 1` liveness probe
//! - **Event store**: write, keyset-paginated read and retention delete with
//!   cancellation and injected clock/metrics
//! - **Cursor codec**: opaque base64 JSON resume tokens
//! - **Migrations**: version-tracked schema applied on start

#![deny(unsafe_code)]

pub mod cursor;
pub mod errors;
pub mod sqlite;
pub mod store;
pub mod types;

pub use cursor::{Cursor, CursorError};
pub use errors::{ErrorKind, Result, StoreError};
pub use sqlite::{ConnectionConfig, DatabaseUrl};
pub use store::{ConnectionManager, EventStore};
pub use types::{DEFAULT_PAGE_SIZE, Event, MAX_PAGE_SIZE, Page, ReadQuery, resolve_page_size};
