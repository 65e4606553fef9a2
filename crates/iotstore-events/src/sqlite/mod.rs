//! `SQLite` backend for the event store.
//!
//! - **[`connection`]**: database URL parsing and the `r2d2` pool with WAL
//!   and busy-timeout pragmas applied to every connection.
//! - **[`migrations`]**: version-tracked schema, embedded at compile time and
//!   applied transactionally.
//! - **[`repositories`]**: stateless repository structs; each method takes
//!   `&Connection` and executes SQL.

pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{ConnectionConfig, ConnectionPool, DatabaseUrl, PooledConnection, open_pool};
pub use migrations::{current_version, latest_version, run_migrations};
