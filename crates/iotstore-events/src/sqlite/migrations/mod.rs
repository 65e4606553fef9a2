//! Embedded schema migrations.
//!
//! Each step is compiled in with [`include_str!`] and applied in its own
//! transaction, so a failing step leaves the previous schema intact.
//! Applied steps are recorded in `schema_migrations`; re-running is a no-op.

use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::errors::{Result, StoreError};

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    name: "events and certificates tables with pagination indexes",
    sql: include_str!("v001_schema.sql"),
}];

const BOOKKEEPING: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    name       TEXT    NOT NULL,
    applied_at TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)";

/// Bring the schema up to date. Returns how many steps were applied.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    conn.execute_batch(BOOKKEEPING)
        .map_err(|e| migration_error(format!("cannot create schema_migrations: {e}")))?;

    let from = current_version(conn)?;
    let pending: Vec<&Step> = STEPS.iter().filter(|step| step.version > from).collect();
    if pending.is_empty() {
        debug!(version = from, "schema is current");
        return Ok(0);
    }

    for step in &pending {
        info!(version = step.version, name = step.name, "applying schema step");
        apply(conn, step)?;
    }
    let applied = u32::try_from(pending.len()).map_err(|e| migration_error(e.to_string()))?;
    info!(from, to = latest_version(), applied, "schema migrated");
    Ok(applied)
}

/// Highest applied version, 0 on a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT IFNULL(MAX(version), 0) FROM schema_migrations", [], |row| {
        row.get(0)
    })
    .map_err(|e| migration_error(format!("cannot read schema_migrations: {e}")))
}

/// Version the schema reaches once every step has run.
pub fn latest_version() -> u32 {
    STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

fn apply(conn: &Connection, step: &Step) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| step_error(step, &e))?;
    tx.execute_batch(step.sql).map_err(|e| step_error(step, &e))?;
    let _ = tx
        .execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![step.version, step.name],
        )
        .map_err(|e| step_error(step, &e))?;
    tx.commit().map_err(|e| step_error(step, &e))
}

fn step_error(step: &Step, e: &rusqlite::Error) -> StoreError {
    migration_error(format!("step v{:03} ({}): {e}", step.version, step.name))
}

fn migration_error(message: String) -> StoreError {
    StoreError::Migration { message }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
