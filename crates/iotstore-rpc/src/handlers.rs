//! `WriteData` and `ReadData` method handlers.
//!
//! Each handler parses the params object into its request type and forwards
//! it to the context's [`Datastore`](crate::datastore::Datastore).

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::registry::{MethodHandler, MethodRegistry};
use crate::types::{ReadRequest, WriteRequest};

/// Method name of the write operation.
pub const WRITE_DATA: &str = "WriteData";
/// Method name of the read operation.
pub const READ_DATA: &str = "ReadData";

/// Registry with every Datastore method registered.
pub fn datastore_registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register(WRITE_DATA, WriteDataHandler);
    registry.register(READ_DATA, ReadDataHandler);
    registry
}

fn parse<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
    let params = match params {
        None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
        Some(params) => params,
    };
    serde_json::from_value(params).map_err(|e| RpcError::Malformed {
        message: format!("invalid request body: {e}"),
    })
}

fn to_value<T: Serialize>(response: &T) -> Result<Value, RpcError> {
    serde_json::to_value(response).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize response");
        RpcError::internal()
    })
}

/// Append one event.
pub struct WriteDataHandler;

#[async_trait]
impl MethodHandler for WriteDataHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let request: WriteRequest = parse(params)?;
        let response = ctx.datastore.write_data(&ctx.cancel, request).await?;
        to_value(&response)
    }
}

/// Read one page of events.
pub struct ReadDataHandler;

#[async_trait]
impl MethodHandler for ReadDataHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let request: ReadRequest = parse(params)?;
        let response = ctx.datastore.read_data(&ctx.cancel, request).await?;
        to_value(&response)
    }
}
