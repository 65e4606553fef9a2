//! Event repository: insert, keyset page scan and retention delete on the
//! `events` table.

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row, params, params_from_iter};

use iotstore_core::time::{format_timestamp, parse_timestamp};

use crate::errors::Result;
use crate::types::{Event, NewEvent};

/// Bounds of a single page scan, already validated.
#[derive(Clone, Debug)]
pub struct PageScan<'a> {
    /// Partition to scan.
    pub partition_key: &'a str,
    /// Inclusive lower bound on `recorded_at`.
    pub start_time: DateTime<Utc>,
    /// Exclusive upper bound on `recorded_at`.
    pub end_time: Option<DateTime<Utc>>,
    /// Resume strictly after this `(recorded_at, id)` position.
    pub after: Option<(DateTime<Utc>, i64)>,
    /// Maximum rows to return.
    pub limit: u32,
}

/// Event repository: stateless, every method takes `&Connection`.
pub struct EventRepo;

impl EventRepo {
    /// Insert one event. Returns the assigned id and the stored `recorded_at`.
    ///
    /// The stored time is `max(event.recorded_at, newest recorded_at in the
    /// partition)`, evaluated inside the insert, so a wall clock that steps
    /// backwards cannot reorder a partition.
    pub fn insert(conn: &Connection, event: &NewEvent<'_>) -> Result<(i64, DateTime<Utc>)> {
        let (id, recorded_at): (i64, String) = conn.query_row(
            "INSERT INTO events (partition_key, recorded_at, data, device_token)
             VALUES (
                 ?1,
                 MAX(?2, COALESCE((SELECT MAX(recorded_at) FROM events WHERE partition_key = ?1), ?2)),
                 ?3,
                 ?4
             )
             RETURNING id, recorded_at",
            params![
                event.partition_key,
                format_timestamp(&event.recorded_at),
                event.data,
                event.device_token
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((id, parse_recorded_at(&recorded_at, 1)?))
    }

    /// One page of a partition in `(recorded_at, id)` order.
    ///
    /// With `after = (ts, id)` the scan keeps an inclusive lower bound on
    /// `ts` and excludes rows at or before `(ts, id)`, so rows sharing the
    /// boundary timestamp but carrying a higher id are still returned.
    pub fn page(conn: &Connection, scan: &PageScan<'_>) -> Result<Vec<Event>> {
        let mut sql = String::from(
            "SELECT id, partition_key, recorded_at, data, device_token
             FROM events
             WHERE partition_key = ?1 AND recorded_at >= ?2",
        );
        let mut args = vec![
            Value::Text(scan.partition_key.to_owned()),
            Value::Text(format_timestamp(&scan.start_time)),
        ];

        if let Some(end) = scan.end_time {
            args.push(Value::Text(format_timestamp(&end)));
            sql.push_str(&format!(" AND recorded_at < ?{}", args.len()));
        }

        if let Some((ts, id)) = scan.after {
            args.push(Value::Text(format_timestamp(&ts)));
            let ts_param = args.len();
            args.push(Value::Integer(id));
            let id_param = args.len();
            sql.push_str(&format!(
                " AND recorded_at >= ?{ts_param} AND (recorded_at > ?{ts_param} OR id > ?{id_param})"
            ));
        }

        args.push(Value::Integer(i64::from(scan.limit)));
        sql.push_str(&format!(" ORDER BY recorded_at ASC, id ASC LIMIT ?{}", args.len()));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), Self::map_row)?;
        let events = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// Delete every event recorded strictly before `threshold`, across all
    /// partitions. Returns the number of rows removed.
    pub fn delete_before(conn: &Connection, threshold: &DateTime<Utc>) -> Result<u64> {
        let deleted = conn.execute(
            "DELETE FROM events WHERE recorded_at < ?1",
            params![format_timestamp(threshold)],
        )?;
        Ok(deleted as u64)
    }

    /// Number of events stored for a partition.
    pub fn count(conn: &Connection, partition_key: &str) -> Result<u64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE partition_key = ?1",
            params![partition_key],
            |row| row.get(0),
        )?;
        Ok(count.unsigned_abs())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Event> {
        let recorded_at: String = row.get(2)?;
        Ok(Event {
            id: row.get(0)?,
            partition_key: row.get(1)?,
            recorded_at: parse_recorded_at(&recorded_at, 2)?,
            data: row.get(3)?,
            device_token: row.get(4)?,
        })
    }
}

fn parse_recorded_at(text: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    parse_timestamp(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
