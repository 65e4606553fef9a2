//! RPC error codes and error type.
//!
//! Codes follow the Twirp vocabulary so existing Datastore clients keep
//! working: argument problems are `invalid_argument` with the offending field
//! in `meta.argument`, everything the caller cannot fix is `internal`.

use std::collections::BTreeMap;

use crate::types::{RpcErrorBody, TwirpErrorBody};

// ── Error code constants ────────────────────────────────────────────

/// Missing or out-of-range request field.
pub const INVALID_ARGUMENT: &str = "invalid_argument";
/// Request body could not be parsed.
pub const MALFORMED: &str = "malformed";
/// No such method.
pub const BAD_ROUTE: &str = "bad_route";
/// Handler exceeded its time budget.
pub const DEADLINE_EXCEEDED: &str = "deadline_exceeded";
/// The request was cancelled (e.g. server shutting down).
pub const CANCELED: &str = "canceled";
/// Unexpected failure; details are logged, not returned.
pub const INTERNAL: &str = "internal";

/// Message returned for every [`RpcError::Internal`] built by the adapter.
pub const INTERNAL_MESSAGE: &str = "internal error";

/// RPC error type returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// A required field is missing or empty.
    #[error("{argument} is required")]
    RequiredArgument {
        /// Wire name of the field.
        argument: &'static str,
    },

    /// A field is present but unusable.
    #[error("{argument} {message}")]
    InvalidArgument {
        /// Wire name of the field.
        argument: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The request body is not the JSON object the method expects.
    #[error("{message}")]
    Malformed {
        /// Parse failure.
        message: String,
    },

    /// No handler is registered for the method.
    #[error("no handler for method {method}")]
    MethodNotFound {
        /// Requested method.
        method: String,
    },

    /// The handler did not finish in time.
    #[error("{method} timed out")]
    Timeout {
        /// Method that timed out.
        method: String,
    },

    /// The request was cancelled before it completed.
    #[error("request cancelled")]
    Cancelled,

    /// Internal server error.
    #[error("{message}")]
    Internal {
        /// Client-facing description.
        message: String,
    },
}

impl RpcError {
    /// Build a [`RpcError::RequiredArgument`].
    pub fn required(argument: &'static str) -> Self {
        Self::RequiredArgument { argument }
    }

    /// Build a [`RpcError::InvalidArgument`].
    pub fn invalid(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    /// An [`RpcError::Internal`] carrying the generic message.
    pub fn internal() -> Self {
        Self::Internal {
            message: INTERNAL_MESSAGE.to_owned(),
        }
    }

    /// Machine-readable error code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RequiredArgument { .. } | Self::InvalidArgument { .. } => INVALID_ARGUMENT,
            Self::Malformed { .. } => MALFORMED,
            Self::MethodNotFound { .. } => BAD_ROUTE,
            Self::Timeout { .. } => DEADLINE_EXCEEDED,
            Self::Cancelled => CANCELED,
            Self::Internal { .. } => INTERNAL,
        }
    }

    /// HTTP status the Twirp route answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::RequiredArgument { .. } | Self::InvalidArgument { .. } | Self::Malformed { .. } => 400,
            Self::MethodNotFound { .. } => 404,
            Self::Timeout { .. } | Self::Cancelled => 408,
            Self::Internal { .. } => 500,
        }
    }

    /// The `argument` entry for argument errors.
    pub fn meta(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();
        if let Self::RequiredArgument { argument } | Self::InvalidArgument { argument, .. } = self {
            let _ = meta.insert("argument".to_owned(), (*argument).to_owned());
        }
        meta
    }

    /// Body of a failed `/twirp/...` call.
    pub fn to_twirp_body(&self) -> TwirpErrorBody {
        TwirpErrorBody {
            code: self.code().to_owned(),
            msg: self.to_string(),
            meta: self.meta(),
        }
    }

    /// Error payload inside an [`RpcResponse`](crate::types::RpcResponse).
    pub fn to_error_body(&self) -> RpcErrorBody {
        RpcErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
            meta: self.meta(),
        }
    }
}
