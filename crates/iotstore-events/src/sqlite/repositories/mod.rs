//! Repository implementations for `SQLite` database operations.
//!
//! Each repository is a stateless struct whose methods take a `&Connection`
//! parameter, so every operation is a function from (connection, input) to
//! output and can be tested against a bare in-memory connection.

pub mod certificate;
pub mod event;

pub use certificate::CertificateRepo;
pub use event::{EventRepo, PageScan};
