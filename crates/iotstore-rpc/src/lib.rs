//! # iotstore-rpc
//!
//! The Datastore RPC contract and its implementation:
//!
//! - [`types`]: `WriteData` / `ReadData` messages and the `/rpc` envelope
//! - [`errors`]: Twirp-style error codes
//! - [`datastore`]: the [`Datastore`] capability the transport calls
//! - [`service`]: [`DatastoreService`], the adapter over
//!   [`iotstore_events::EventStore`]
//! - [`registry`] / [`handlers`]: name-based dispatch with timeouts and
//!   per-method metrics

#![deny(unsafe_code)]

pub mod context;
pub mod datastore;
pub mod errors;
pub mod handlers;
pub mod registry;
pub mod service;
pub mod types;

pub use context::RpcContext;
pub use datastore::Datastore;
pub use errors::RpcError;
pub use handlers::{READ_DATA, WRITE_DATA, datastore_registry};
pub use registry::{MethodHandler, MethodRegistry};
pub use service::DatastoreService;
pub use types::{
    EncryptedEvent, ReadRequest, ReadResponse, RpcErrorBody, RpcRequest, RpcResponse, TwirpErrorBody,
    WriteRequest, WriteResponse,
};
