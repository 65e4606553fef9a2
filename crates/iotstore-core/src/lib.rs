//! # iotstore-core
//!
//! Primitives shared by every iotstore crate:
//!
//! - [`clock`]: injectable wall clock used to stamp events
//! - [`metrics`]: injectable metrics sink with a no-op default
//! - [`time`]: fixed-width RFC 3339 text codec for stored timestamps
//! - [`retry`]: bounded exponential backoff with a deadline

#![deny(unsafe_code)]

pub mod clock;
pub mod metrics;
pub mod retry;
pub mod time;

pub use clock::{Clock, ManualClock, SystemClock};
pub use metrics::{Metrics, NoopMetrics, Outcome};
pub use retry::{RetryConfig, retry_with_backoff};
