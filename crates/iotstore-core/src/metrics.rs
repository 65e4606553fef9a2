//! Injectable metrics sink.
//!
//! The store, the RPC layer and the HTTP middleware report through a
//! [`Metrics`] handle passed in at construction instead of touching a global
//! registry. Production wires in a Prometheus-backed implementation; tests use
//! [`NoopMetrics`] or [`RecordingMetrics`].

use std::time::Duration;

use parking_lot::Mutex;

/// Result of an instrumented operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Completed successfully.
    Ok,
    /// Failed with an error.
    Error,
    /// Abandoned because the caller cancelled.
    Cancelled,
}

impl Outcome {
    /// Label value used in metric series.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Sink for the metrics emitted by iotstore components.
///
/// Every method defaults to doing nothing.
pub trait Metrics: Send + Sync {
    /// A storage engine operation finished.
    fn observe_store_operation(&self, _operation: &'static str, _outcome: Outcome, _elapsed: Duration) {}

    /// An RPC method finished. `error_code` is `None` on success.
    fn observe_rpc(&self, _method: &str, _error_code: Option<&str>, _elapsed: Duration) {}

    /// An HTTP request finished.
    fn observe_http_request(&self, _status: u16, _method: &str, _path: &str, _elapsed: Duration) {}

    /// Publish build information once at startup.
    fn set_build_info(&self, _name: &str, _version: &str, _build_date: &str) {}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {}

/// One observation captured by [`RecordingMetrics`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Observation {
    /// See [`Metrics::observe_store_operation`].
    Store {
        /// Operation name.
        operation: &'static str,
        /// Outcome.
        outcome: Outcome,
    },
    /// See [`Metrics::observe_rpc`].
    Rpc {
        /// Method name.
        method: String,
        /// Error code, if the call failed.
        error_code: Option<String>,
    },
    /// See [`Metrics::observe_http_request`].
    Http {
        /// Response status.
        status: u16,
        /// HTTP method.
        method: String,
        /// Request path.
        path: String,
    },
    /// See [`Metrics::set_build_info`].
    BuildInfo {
        /// Binary name.
        name: String,
        /// Version string.
        version: String,
    },
}

/// Keeps every observation in memory, without durations.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    observations: Mutex<Vec<Observation>>,
}

impl RecordingMetrics {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything observed so far.
    pub fn observations(&self) -> Vec<Observation> {
        self.observations.lock().clone()
    }

    fn push(&self, observation: Observation) {
        self.observations.lock().push(observation);
    }
}

impl Metrics for RecordingMetrics {
    fn observe_store_operation(&self, operation: &'static str, outcome: Outcome, _elapsed: Duration) {
        self.push(Observation::Store { operation, outcome });
    }

    fn observe_rpc(&self, method: &str, error_code: Option<&str>, _elapsed: Duration) {
        self.push(Observation::Rpc {
            method: method.to_owned(),
            error_code: error_code.map(ToOwned::to_owned),
        });
    }

    fn observe_http_request(&self, status: u16, method: &str, path: &str, _elapsed: Duration) {
        self.push(Observation::Http {
            status,
            method: method.to_owned(),
            path: path.to_owned(),
        });
    }

    fn set_build_info(&self, name: &str, version: &str, _build_date: &str) {
        self.push(Observation::BuildInfo {
            name: name.to_owned(),
            version: version.to_owned(),
        });
    }
}
