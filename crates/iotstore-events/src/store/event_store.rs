//! High-level `EventStore` API.
//!
//! Turns write, read and retention requests into repository calls on a
//! pooled connection. Each operation:
//!
//! - runs on the blocking thread pool, holding one connection
//! - wraps mutations in a transaction that commits only if the caller has
//!   not cancelled
//! - aborts the in-flight statement via `SQLite`'s interrupt handle when the
//!   caller's [`CancellationToken`] fires
//! - reports its duration and outcome to the injected [`Metrics`] sink

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, InterruptHandle, Transaction, TransactionBehavior};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use iotstore_core::time::{format_timestamp, is_storable, is_zero};
use iotstore_core::{Clock, Metrics, NoopMetrics, Outcome, SystemClock};

use crate::cursor::Cursor;
use crate::errors::{ErrorKind, Result, StoreError};
use crate::sqlite::repositories::{CertificateRepo, EventRepo, PageScan};
use crate::store::connection_manager::ConnectionManager;
use crate::types::{NewEvent, Page, ReadQuery, resolve_page_size};

/// Append-only event store over a managed connection pool.
pub struct EventStore {
    connections: ConnectionManager,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn Metrics>,
}

impl EventStore {
    /// Create a store using the system clock and no metrics.
    pub fn new(connections: ConnectionManager) -> Self {
        Self {
            connections,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Replace the clock used to stamp `recorded_at`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The underlying connection manager.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Open the pool and apply migrations.
    pub async fn start(&self) -> Result<()> {
        self.connections.start().await
    }

    /// Close the pool.
    pub fn stop(&self) {
        self.connections.stop();
    }

    /// Execute a trivial query against the database.
    pub async fn ping(&self) -> Result<()> {
        self.connections.ping().await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────

    /// Append one event, stamped with the store's clock. Returns its id.
    pub async fn write_event(
        &self,
        cancel: &CancellationToken,
        partition_key: &str,
        data: &[u8],
        device_token: &str,
    ) -> Result<i64> {
        if partition_key.is_empty() {
            return Err(StoreError::validation("partition_key", "must not be empty"));
        }
        if device_token.is_empty() {
            return Err(StoreError::validation("device_token", "must not be empty"));
        }

        let partition_key = partition_key.to_owned();
        let data = data.to_vec();
        let device_token = device_token.to_owned();
        let recorded_at = self.clock.now();

        self.run("write_event", cancel, move |conn, cancel| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
            let (id, stored_at) = EventRepo::insert(
                &tx,
                &NewEvent {
                    partition_key: &partition_key,
                    data: &data,
                    device_token: &device_token,
                    recorded_at,
                },
            )?;
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            tx.commit()?;
            debug!(
                id,
                partition_key = %partition_key,
                recorded_at = %format_timestamp(&stored_at),
                bytes = data.len(),
                "event written"
            );
            Ok(id)
        })
        .await
    }

    /// Read one page of a partition in `(recorded_at, id)` order.
    ///
    /// A full page yields a cursor for the last event, even if nothing
    /// follows it; a short page yields none.
    pub async fn read_events(&self, cancel: &CancellationToken, query: &ReadQuery) -> Result<Page> {
        if query.partition_key.is_empty() {
            return Err(StoreError::validation("partition_key", "must not be empty"));
        }
        let page_size = resolve_page_size(i64::from(query.page_size))?;
        check_storable("start_time", &query.start_time)?;
        let end_time = query.end_time.filter(|end| !is_zero(end));
        if let Some(end) = &end_time {
            check_storable("end_time", end)?;
        }
        if end_time.is_some_and(|end| end < query.start_time) {
            return Err(StoreError::validation("end_time", "must be after start_time"));
        }
        let after = query
            .cursor
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(Cursor::decode)
            .transpose()?
            .map(|cursor| (cursor.timestamp, cursor.event_id));

        let partition_key = query.partition_key.clone();
        let start_time = query.start_time;

        let events = self
            .run("read_events", cancel, move |conn, _| {
                EventRepo::page(
                    conn,
                    &PageScan {
                        partition_key: &partition_key,
                        start_time,
                        end_time,
                        after,
                        limit: page_size,
                    },
                )
            })
            .await?;

        let next_cursor = match events.last() {
            Some(last) if events.len() == page_size as usize => Some(
                Cursor::new(last.id, last.recorded_at)
                    .encode()
                    .map_err(|e| StoreError::Internal(format!("failed to encode cursor: {e}")))?,
            ),
            _ => None,
        };

        Ok(Page {
            events,
            next_cursor,
        })
    }

    /// Remove every event recorded before `threshold`, in all partitions.
    ///
    /// With `execute = false` the delete runs and is rolled back, so the
    /// returned count previews the effect without losing data.
    pub async fn delete_before(
        &self,
        cancel: &CancellationToken,
        threshold: DateTime<Utc>,
        execute: bool,
    ) -> Result<u64> {
        check_storable("threshold", &threshold)?;
        self.run("delete_before", cancel, move |conn, cancel| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
            let deleted = EventRepo::delete_before(&tx, &threshold)?;
            info!(
                deleted,
                execute,
                threshold = %format_timestamp(&threshold),
                "deleted events before threshold"
            );
            if !execute {
                tx.rollback()?;
                return Ok(deleted);
            }
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            tx.commit()?;
            Ok(deleted)
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Certificates
    // ─────────────────────────────────────────────────────────────────────

    /// Look up a cached certificate.
    pub async fn get_certificate(&self, cancel: &CancellationToken, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_owned();
        self.run("get_certificate", cancel, move |conn, _| CertificateRepo::get(conn, &key))
            .await
    }

    /// Store or replace a cached certificate.
    pub async fn put_certificate(&self, cancel: &CancellationToken, key: &str, certificate: &[u8]) -> Result<()> {
        let key = key.to_owned();
        let certificate = certificate.to_vec();
        self.run("put_certificate", cancel, move |conn, _| {
            CertificateRepo::put(conn, &key, &certificate)
        })
        .await
    }

    /// Drop a cached certificate. Missing keys are not an error.
    pub async fn delete_certificate(&self, cancel: &CancellationToken, key: &str) -> Result<()> {
        let key = key.to_owned();
        self.run("delete_certificate", cancel, move |conn, _| {
            let _ = CertificateRepo::delete(conn, &key)?;
            Ok(())
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────

    /// Run `work` on a pooled connection, recording metrics and logging
    /// backend failures.
    async fn run<T, F>(&self, operation: &'static str, cancel: &CancellationToken, work: F) -> Result<T>
    where
        F: FnOnce(&Connection, &CancellationToken) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let started = Instant::now();
        let result = self.run_blocking(cancel, work).await;

        let outcome = match &result {
            Ok(_) => Outcome::Ok,
            Err(StoreError::Cancelled) => Outcome::Cancelled,
            Err(_) => Outcome::Error,
        };
        self.metrics
            .observe_store_operation(operation, outcome, started.elapsed());

        if let Err(err) = &result {
            if err.kind() == ErrorKind::Storage {
                error!(operation, error = %err, "store operation failed");
            }
        }
        result
    }

    async fn run_blocking<T, F>(&self, cancel: &CancellationToken, work: F) -> Result<T>
    where
        F: FnOnce(&Connection, &CancellationToken) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let pool = self.connections.pool()?;
        let token = cancel.clone();
        let slot = Arc::new(InterruptSlot::default());
        let worker_slot = Arc::clone(&slot);

        let mut task = tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            // Declared after `conn` so the slot is cleared before the
            // connection goes back to the pool.
            let _armed = worker_slot.arm(conn.get_interrupt_handle());
            if token.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            work(&conn, &token)
        });

        tokio::select! {
            joined = &mut task => flatten(joined),
            () = cancel.cancelled() => {
                let interrupted = slot.interrupt();
                debug!(interrupted, "store operation cancelled");
                // The blocking work cannot be aborted; wait for it to observe
                // the interrupt. Work that finished first keeps its result.
                flatten(task.await).map_err(|_| StoreError::Cancelled)
            }
        }
    }
}

/// Interrupt handle of the connection a blocking operation is using. Holds
/// a handle only while that operation still owns its pooled connection.
#[derive(Default)]
struct InterruptSlot(Mutex<Option<InterruptHandle>>);

impl InterruptSlot {
    fn arm(&self, handle: InterruptHandle) -> ArmedInterrupt<'_> {
        *self.0.lock() = Some(handle);
        ArmedInterrupt(self)
    }

    /// Interrupt the armed connection, if any. Returns whether one was armed.
    fn interrupt(&self) -> bool {
        match self.0.lock().as_ref() {
            Some(handle) => {
                handle.interrupt();
                true
            }
            None => false,
        }
    }
}

struct ArmedInterrupt<'a>(&'a InterruptSlot);

impl Drop for ArmedInterrupt<'_> {
    fn drop(&mut self) {
        *self.0.0.lock() = None;
    }
}

/// Stored timestamps compare as text, which only tracks time order for
/// four-digit years.
fn check_storable(field: &'static str, ts: &DateTime<Utc>) -> Result<()> {
    if is_storable(ts) {
        Ok(())
    } else {
        Err(StoreError::validation(field, "must be between years 0000 and 9999"))
    }
}

fn flatten<T>(joined: std::result::Result<Result<T>, JoinError>) -> Result<T> {
    joined.map_err(|e| StoreError::Internal(format!("blocking task failed: {e}")))?
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connection::ConnectionConfig;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use iotstore_core::ManualClock;
    use iotstore_core::metrics::{Observation, RecordingMetrics};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    async fn started_store(clock: Arc<ManualClock>) -> EventStore {
        let store = EventStore::new(ConnectionManager::new(
            "sqlite::memory:",
            ConnectionConfig::default(),
        ))
        .with_clock(clock);
        store.start().await.unwrap();
        store
    }

    fn query(key: &str, page_size: u32) -> ReadQuery {
        ReadQuery {
            partition_key: key.into(),
            page_size,
            start_time: t(0),
            end_time: None,
            cursor: None,
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trip() {
        let clock = Arc::new(ManualClock::new(t(1)));
        let store = started_store(clock.clone()).await;
        let cancel = CancellationToken::new();

        for payload in [b"one".as_slice(), b"two", b"three"] {
            let _ = store.write_event(&cancel, "policy-1", payload, "device").await.unwrap();
            clock.advance(Duration::seconds(1));
        }

        let page = store.read_events(&cancel, &query("policy-1", 10)).await.unwrap();
        let payloads: Vec<&[u8]> = page.events.iter().map(|e| e.data.as_slice()).collect();
        assert_eq!(payloads, vec![b"one".as_slice(), b"two", b"three"]);
        assert_eq!(page.events[0].recorded_at, t(1));
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn write_rejects_empty_fields() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancel = CancellationToken::new();

        assert_matches!(
            store.write_event(&cancel, "", b"x", "device").await,
            Err(StoreError::Validation { field: "partition_key", .. })
        );
        assert_matches!(
            store.write_event(&cancel, "k", b"x", "").await,
            Err(StoreError::Validation { field: "device_token", .. })
        );
        let page = store.read_events(&cancel, &query("k", 10)).await.unwrap();
        assert!(page.events.is_empty());
    }

    #[tokio::test]
    async fn full_page_yields_cursor_short_page_does_not() {
        let clock = Arc::new(ManualClock::new(t(1)));
        let store = started_store(clock.clone()).await;
        let cancel = CancellationToken::new();
        for _ in 0..4 {
            let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();
            clock.advance(Duration::seconds(1));
        }

        let first = store.read_events(&cancel, &query("k", 3)).await.unwrap();
        assert_eq!(first.events.len(), 3);
        let cursor = first.next_cursor.clone().unwrap();

        let second = store
            .read_events(&cancel, &ReadQuery { cursor: Some(cursor), ..query("k", 3) })
            .await
            .unwrap();
        assert_eq!(second.events.len(), 1);
        assert_eq!(second.events[0].recorded_at, t(4));
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn exact_multiple_needs_one_more_request() {
        let clock = Arc::new(ManualClock::new(t(1)));
        let store = started_store(clock.clone()).await;
        let cancel = CancellationToken::new();
        for _ in 0..2 {
            let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();
            clock.advance(Duration::seconds(1));
        }

        let first = store.read_events(&cancel, &query("k", 2)).await.unwrap();
        assert_eq!(first.events.len(), 2);
        let second = store
            .read_events(&cancel, &ReadQuery { cursor: first.next_cursor, ..query("k", 2) })
            .await
            .unwrap();
        assert!(second.events.is_empty());
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn clock_regression_keeps_insertion_order() {
        let clock = Arc::new(ManualClock::new(t(10)));
        let store = started_store(clock.clone()).await;
        let cancel = CancellationToken::new();

        let first = store.write_event(&cancel, "k", b"first", "d").await.unwrap();
        clock.set(t(5));
        let second = store.write_event(&cancel, "k", b"second", "d").await.unwrap();

        let page = store.read_events(&cancel, &query("k", 10)).await.unwrap();
        let ids: Vec<i64> = page.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(page.events[1].recorded_at, t(10));
    }

    #[tokio::test]
    async fn zero_end_time_is_open_range() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancel = CancellationToken::new();
        let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();

        let page = store
            .read_events(
                &cancel,
                &ReadQuery {
                    end_time: Some(DateTime::<Utc>::UNIX_EPOCH),
                    ..query("k", 10)
                },
            )
            .await
            .unwrap();
        assert_eq!(page.events.len(), 1);
    }

    #[tokio::test]
    async fn read_validates_before_touching_the_database() {
        let store = EventStore::new(ConnectionManager::new(
            "sqlite::memory:",
            ConnectionConfig::default(),
        ));
        let cancel = CancellationToken::new();

        // Not started: validation still wins over connection errors.
        assert_matches!(
            store.read_events(&cancel, &query("k", 1001)).await,
            Err(StoreError::Validation { field: "page_size", .. })
        );
        assert_matches!(
            store
                .read_events(&cancel, &ReadQuery { end_time: Some(t(-1)), ..query("k", 1) })
                .await,
            Err(StoreError::Validation { field: "end_time", .. })
        );
        assert_matches!(
            store
                .read_events(&cancel, &ReadQuery { cursor: Some("garbage!".into()), ..query("k", 1) })
                .await,
            Err(StoreError::Decode(_))
        );
        assert_matches!(
            store.read_events(&cancel, &query("k", 1)).await,
            Err(StoreError::Connection { .. })
        );
    }

    #[tokio::test]
    async fn times_beyond_four_digit_years_are_rejected() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancel = CancellationToken::new();
        let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();
        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let negative = Utc.with_ymd_and_hms(-1, 1, 1, 0, 0, 0).unwrap();

        assert_matches!(
            store
                .read_events(&cancel, &ReadQuery { end_time: Some(far), ..query("k", 10) })
                .await,
            Err(StoreError::Validation { field: "end_time", .. })
        );
        assert_matches!(
            store
                .read_events(&cancel, &ReadQuery { start_time: far, ..query("k", 10) })
                .await,
            Err(StoreError::Validation { field: "start_time", .. })
        );
        assert_matches!(
            store
                .read_events(&cancel, &ReadQuery { start_time: negative, ..query("k", 10) })
                .await,
            Err(StoreError::Validation { field: "start_time", .. })
        );
        assert_matches!(
            store.delete_before(&cancel, far, true).await,
            Err(StoreError::Validation { field: "threshold", .. })
        );

        // Nothing was deleted, and the last storable instant still works.
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        let page = store
            .read_events(&cancel, &ReadQuery { end_time: Some(last), ..query("k", 10) })
            .await
            .unwrap();
        assert_eq!(page.events.len(), 1);
    }

    #[tokio::test]
    async fn empty_cursor_means_first_page() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancel = CancellationToken::new();
        let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();

        let page = store
            .read_events(&cancel, &ReadQuery { cursor: Some(String::new()), ..query("k", 10) })
            .await
            .unwrap();
        assert_eq!(page.events.len(), 1);
    }

    #[tokio::test]
    async fn dry_run_delete_changes_nothing() {
        let clock = Arc::new(ManualClock::new(t(1)));
        let store = started_store(clock.clone()).await;
        let cancel = CancellationToken::new();
        for _ in 0..3 {
            let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();
            clock.advance(Duration::seconds(1));
        }

        assert_eq!(store.delete_before(&cancel, t(3), false).await.unwrap(), 2);
        store.ping().await.unwrap();
        let page = store.read_events(&cancel, &query("k", 10)).await.unwrap();
        assert_eq!(page.events.len(), 3);

        assert_eq!(store.delete_before(&cancel, t(3), true).await.unwrap(), 2);
        store.ping().await.unwrap();
        let page = store.read_events(&cancel, &query("k", 10)).await.unwrap();
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].recorded_at, t(3));
    }

    #[tokio::test]
    async fn pre_cancelled_write_commits_nothing() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancelled = CancellationToken::new();
        cancelled.cancel();

        assert_matches!(
            store.write_event(&cancelled, "k", b"x", "d").await,
            Err(StoreError::Cancelled)
        );
        let page = store
            .read_events(&CancellationToken::new(), &query("k", 10))
            .await
            .unwrap();
        assert!(page.events.is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_running_statement() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let _canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = store
            .run("spin", &cancel, |conn, _| {
                let n: i64 = conn.query_row(
                    "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 1000000000000)
                     SELECT COUNT(*) FROM c",
                    [],
                    |row| row.get(0),
                )?;
                Ok(n)
            })
            .await;
        assert_matches!(result, Err(StoreError::Cancelled));

        // The connection is usable again afterwards.
        store.ping().await.unwrap();
    }

    #[test]
    fn interrupt_reaches_only_a_connection_still_in_use() {
        let conn = Connection::open_in_memory().unwrap();
        let slot = InterruptSlot::default();
        assert!(!slot.interrupt());

        {
            let _armed = slot.arm(conn.get_interrupt_handle());
            assert!(slot.interrupt());
        }

        // Released to the pool: a late cancellation has nothing to interrupt.
        assert!(!slot.interrupt());
    }

    #[tokio::test]
    async fn cancel_after_completion_leaves_pooled_connection_alone() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancel = CancellationToken::new();
        let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();
        cancel.cancel();

        let page = store
            .read_events(&CancellationToken::new(), &query("k", 10))
            .await
            .unwrap();
        assert_eq!(page.events.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_transaction_rolls_back() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let result = store
            .run("write_then_cancel", &cancel, move |conn, token| {
                let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
                let _ = EventRepo::insert(
                    &tx,
                    &NewEvent {
                        partition_key: "k",
                        data: b"x",
                        device_token: "d",
                        recorded_at: t(1),
                    },
                )?;
                trigger.cancel();
                if token.is_cancelled() {
                    return Err(StoreError::Cancelled);
                }
                tx.commit()?;
                Ok(())
            })
            .await;
        assert_matches!(result, Err(StoreError::Cancelled));

        let page = store
            .read_events(&CancellationToken::new(), &query("k", 10))
            .await
            .unwrap();
        assert!(page.events.is_empty());
    }

    #[tokio::test]
    async fn certificates_round_trip() {
        let store = started_store(Arc::new(ManualClock::new(t(1)))).await;
        let cancel = CancellationToken::new();

        assert!(store.get_certificate(&cancel, "host").await.unwrap().is_none());
        store.put_certificate(&cancel, "host", b"pem").await.unwrap();
        assert_eq!(
            store.get_certificate(&cancel, "host").await.unwrap().as_deref(),
            Some(b"pem".as_slice())
        );
        store.delete_certificate(&cancel, "host").await.unwrap();
        store.delete_certificate(&cancel, "host").await.unwrap();
        assert!(store.get_certificate(&cancel, "host").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn operations_report_metrics() {
        let metrics = Arc::new(RecordingMetrics::new());
        let store = started_store(Arc::new(ManualClock::new(t(1))))
            .await
            .with_metrics(metrics.clone());
        let cancel = CancellationToken::new();

        let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();
        let _ = store.read_events(&cancel, &query("k", 10)).await.unwrap();
        store.stop();
        let _ = store.delete_before(&cancel, t(5), false).await;

        assert_eq!(
            metrics.observations(),
            vec![
                Observation::Store { operation: "write_event", outcome: Outcome::Ok },
                Observation::Store { operation: "read_events", outcome: Outcome::Ok },
                Observation::Store { operation: "delete_before", outcome: Outcome::Error },
            ]
        );
    }
}
