//! Certificate repository: opaque key/value blobs in the `certificates`
//! table, used as a TLS certificate cache.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;

/// Certificate repository: stateless, every method takes `&Connection`.
pub struct CertificateRepo;

impl CertificateRepo {
    /// Fetch a certificate by key.
    pub fn get(conn: &Connection, key: &str) -> Result<Option<Vec<u8>>> {
        let cert = conn
            .query_row(
                "SELECT certificate FROM certificates WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(cert)
    }

    /// Insert or replace a certificate.
    pub fn put(conn: &Connection, key: &str, certificate: &[u8]) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO certificates (key, certificate) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET certificate = excluded.certificate",
            params![key, certificate],
        )?;
        Ok(())
    }

    /// Remove a certificate. Returns whether a row existed.
    pub fn delete(conn: &Connection, key: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM certificates WHERE key = ?1", params![key])?;
        Ok(changed > 0)
    }
}
