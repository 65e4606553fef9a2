//! Bounded exponential backoff.
//!
//! - [`RetryConfig`]: backoff parameters plus an overall deadline
//! - [`backoff_delay`]: exponential backoff with symmetric jitter
//! - [`retry_with_backoff`]: re-run a fallible async operation until it
//!   succeeds or the next wait would cross the deadline

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;
/// Default maximum delay between attempts in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 60_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.5;
/// Default overall deadline in milliseconds (5 minutes).
pub const DEFAULT_MAX_ELAPSED_MS: u64 = 300_000;

/// Configuration for retry logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Base delay for exponential backoff in ms (default: 500).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in ms (default: 60000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (default: 0.5).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
    /// Give up once waiting again would exceed this many ms since the
    /// first attempt (default: 300000).
    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}
fn default_max_elapsed_ms() -> u64 {
    DEFAULT_MAX_ELAPSED_MS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            max_elapsed_ms: DEFAULT_MAX_ELAPSED_MS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backoff calculation
// ─────────────────────────────────────────────────────────────────────────────

/// Delay before retry number `attempt` (zero-based).
///
/// Formula: `min(max_delay, base_delay * 2^attempt) * (1 + (2 * random - 1) * jitter)`
///
/// `random` should be a value in `[0.0, 1.0)`. A jitter factor of 0.5 spreads
/// the delay over ±50% of the capped exponential value.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn backoff_delay(attempt: u32, config: &RetryConfig, random: f64) -> Duration {
    let exponential = config
        .base_delay_ms
        .saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(config.max_delay_ms);

    let jitter = 1.0 + (random * 2.0 - 1.0) * config.jitter_factor.clamp(0.0, 1.0);
    let with_jitter = (capped as f64) * jitter;

    Duration::from_millis(with_jitter.round().max(0.0) as u64)
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution
// ─────────────────────────────────────────────────────────────────────────────

/// Run `op` until it succeeds or the deadline is reached.
///
/// The first attempt always runs. After a failure the next delay is
/// computed; if sleeping that long would pass `max_elapsed_ms` since the
/// first attempt, the last error is returned instead.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let deadline = Duration::from_millis(config.max_elapsed_ms);
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation, attempts = attempt + 1, "succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => {
                let delay = backoff_delay(attempt, config, rand::random::<f64>());
                if started.elapsed() + delay > deadline {
                    warn!(
                        operation,
                        attempts = attempt + 1,
                        error = %err,
                        "retry deadline reached, giving up"
                    );
                    return Err(err);
                }
                warn!(
                    operation,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_jitter(base: u64, max: u64, deadline: u64) -> RetryConfig {
        RetryConfig {
            base_delay_ms: base,
            max_delay_ms: max,
            jitter_factor: 0.0,
            max_elapsed_ms: deadline,
        }
    }

    #[test]
    fn defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.base_delay_ms, 500);
        assert_eq!(config.max_delay_ms, 60_000);
        assert!((config.jitter_factor - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.max_elapsed_ms, 300_000);
    }

    #[test]
    fn config_deserializes_partial() {
        let config: RetryConfig = serde_json::from_str(r#"{"max_elapsed_ms": 1000}"#).unwrap();
        assert_eq!(config.max_elapsed_ms, 1000);
        assert_eq!(config.base_delay_ms, DEFAULT_BASE_DELAY_MS);
    }

    #[test]
    fn backoff_doubles_until_cap() {
        let config = no_jitter(100, 1000, 0);
        assert_eq!(backoff_delay(0, &config, 0.5), Duration::from_millis(100));
        assert_eq!(backoff_delay(1, &config, 0.5), Duration::from_millis(200));
        assert_eq!(backoff_delay(3, &config, 0.5), Duration::from_millis(800));
        assert_eq!(backoff_delay(4, &config, 0.5), Duration::from_millis(1000));
        assert_eq!(backoff_delay(63, &config, 0.5), Duration::from_millis(1000));
    }

    #[test]
    fn jitter_spreads_both_ways() {
        let config = RetryConfig {
            jitter_factor: 0.5,
            ..no_jitter(1000, 60_000, 0)
        };
        assert_eq!(backoff_delay(0, &config, 0.0), Duration::from_millis(500));
        assert_eq!(backoff_delay(0, &config, 0.5), Duration::from_millis(1000));
        assert_eq!(backoff_delay(0, &config, 1.0), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<&str, String> =
            retry_with_backoff(&no_jitter(1000, 60_000, 300_000), "test", || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 3 { Err(format!("fail {n}")) } else { Ok("ready") }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_deadline_with_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        // Waits of 1s, 2s, 4s fit in 10s; the fourth wait (8s) would not.
        let result: Result<(), String> =
            retry_with_backoff(&no_jitter(1000, 60_000, 10_000), "test", || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Err(format!("fail {n}"))
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), "fail 3");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_deadline_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = retry_with_backoff(&no_jitter(1, 1, 0), "test", || {
            let counter = counter.clone();
            async move {
                let _ = counter.fetch_add(1, Ordering::SeqCst);
                Err("nope".to_owned())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
