//! Storage engine: pool lifecycle plus the event and certificate operations
//! built on it.

pub mod connection_manager;
pub mod event_store;

pub use connection_manager::ConnectionManager;
pub use event_store::EventStore;
