//! # iotstore-logging
//!
//! Process-wide `tracing` setup for the iotstore binary, plus an in-memory
//! capture layer for asserting on log output in tests.
//!
//! Libraries in the workspace only emit events through `tracing` macros;
//! installing a subscriber is the binary's job.

#![deny(unsafe_code)]

pub mod capture;

pub use capture::{CapturedEvent, CapturedLogs, capture_logs};

use tracing::Span;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Value of the `service` field on the root span.
pub const SERVICE_NAME: &str = "iotstore";

/// Output format of the stderr layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// One JSON object per line, with enclosing span fields.
    #[default]
    Json,
    /// Human-readable.
    Pretty,
}

/// Filter from `RUST_LOG` if set and valid, else `level`.
///
/// An unparsable `level` falls back to `info`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_subscriber(level: &str, format: Format) {
    let filter = build_filter(level);
    let registry = tracing_subscriber::registry().with(filter);

    let _ = match format {
        Format::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        Format::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init(),
    };
}

/// Root span carrying `service = "iotstore"`; the binary runs inside it.
pub fn service_span() -> Span {
    tracing::info_span!("service", service = SERVICE_NAME)
}
