//! Prometheus-backed [`Metrics`] and the `/metrics` exposition.
//!
//! Uses the `metrics` facade with a `metrics-exporter-prometheus` recorder.
//! The recorder is installed once at startup; tests build a local one.

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use iotstore_core::{Metrics, Outcome};

use crate::errors::ServerError;

/// Histogram: HTTP request duration by status, method and path.
pub const REQUEST_DURATION_SECONDS: &str = "decode_datastore_request_duration_sec";
/// Gauge: constant 1 labelled with build information.
pub const BUILD_INFO: &str = "decode_datastore_build_info";
/// Counter: RPC calls by method.
pub const RPC_REQUESTS_TOTAL: &str = "rpc_requests_total";
/// Counter: failed RPC calls by method and error code.
pub const RPC_ERRORS_TOTAL: &str = "rpc_errors_total";
/// Histogram: RPC handler duration by method.
pub const RPC_REQUEST_DURATION_SECONDS: &str = "rpc_request_duration_seconds";
/// Histogram: storage engine operation duration by operation and outcome.
pub const STORE_OPERATION_DURATION_SECONDS: &str = "store_operation_duration_seconds";

/// Bucket boundaries shared by every histogram, in seconds.
pub const HISTOGRAM_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Forwards observations to whatever recorder the `metrics` facade holds.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrometheusMetrics;

impl Metrics for PrometheusMetrics {
    fn observe_store_operation(&self, operation: &'static str, outcome: Outcome, elapsed: Duration) {
        histogram!(
            STORE_OPERATION_DURATION_SECONDS,
            "operation" => operation,
            "outcome" => outcome.as_str()
        )
        .record(elapsed.as_secs_f64());
    }

    fn observe_rpc(&self, method: &str, error_code: Option<&str>, elapsed: Duration) {
        counter!(RPC_REQUESTS_TOTAL, "method" => method.to_owned()).increment(1);
        if let Some(code) = error_code {
            counter!(
                RPC_ERRORS_TOTAL,
                "method" => method.to_owned(),
                "error_type" => code.to_owned()
            )
            .increment(1);
        }
        histogram!(RPC_REQUEST_DURATION_SECONDS, "method" => method.to_owned())
            .record(elapsed.as_secs_f64());
    }

    fn observe_http_request(&self, status: u16, method: &str, path: &str, elapsed: Duration) {
        histogram!(
            REQUEST_DURATION_SECONDS,
            "status_code" => status.to_string(),
            "method" => method.to_owned(),
            "path" => path.to_owned()
        )
        .record(elapsed.as_secs_f64());
    }

    fn set_build_info(&self, name: &str, version: &str, build_date: &str) {
        gauge!(
            BUILD_INFO,
            "name" => name.to_owned(),
            "version" => version.to_owned(),
            "build_date" => build_date.to_owned()
        )
        .set(1.0);
    }
}

fn builder() -> Result<PrometheusBuilder, ServerError> {
    PrometheusBuilder::new()
        .set_buckets(&HISTOGRAM_BUCKETS)
        .map_err(|e| ServerError::Metrics(e.to_string()))
}

/// Install the Prometheus recorder globally and return its render handle.
///
/// Fails if a recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, ServerError> {
    builder()?
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))
}

/// Render the current metrics in Prometheus text format.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}
