//! The Datastore capability: what the transport calls into.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::RpcError;
use crate::types::{ReadRequest, ReadResponse, WriteRequest, WriteResponse};

/// The two client-facing Datastore operations.
///
/// Implementations validate their input and return errors already mapped to
/// the RPC vocabulary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Append one event.
    async fn write_data(
        &self,
        cancel: &CancellationToken,
        request: WriteRequest,
    ) -> Result<WriteResponse, RpcError>;

    /// Read one page of a partition.
    async fn read_data(
        &self,
        cancel: &CancellationToken,
        request: ReadRequest,
    ) -> Result<ReadResponse, RpcError>;
}
