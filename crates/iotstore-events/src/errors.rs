//! Error types for the event store.
//!
//! [`StoreError`] is returned by every engine operation. [`StoreError::kind`]
//! folds the variants into the coarse taxonomy the RPC layer maps onto wire
//! error codes.

use thiserror::Error;

use crate::cursor::CursorError;

/// Errors that can occur during event store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A caller supplied an unusable argument.
    #[error("invalid argument {field}: {message}")]
    Validation {
        /// Offending field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A page cursor could not be decoded.
    #[error("failed to decode page cursor: {0}")]
    Decode(#[from] CursorError),

    /// The connection pool is not available (never started, stopped, or the
    /// database could not be opened).
    #[error("connection error: {message}")]
    Connection {
        /// Describes the failure.
        message: String,
    },

    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// The caller cancelled the operation before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal error (e.g. a blocking task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`StoreError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller's fault; retrying the same request will fail again.
    Validation,
    /// Malformed or tampered page cursor.
    Decode,
    /// Pool not started or already stopped.
    Connection,
    /// Backend failure.
    Storage,
    /// Caller went away.
    Cancelled,
}

impl StoreError {
    /// Build a [`StoreError::Validation`].
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Build a [`StoreError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Sqlite(_) | Self::Pool(_) | Self::Migration { .. } | Self::Internal(_) => {
                ErrorKind::Storage
            }
        }
    }
}

/// Convenience type alias for event store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
