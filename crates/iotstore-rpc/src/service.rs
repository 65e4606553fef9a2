//! [`Datastore`] implementation over the event store.
//!
//! Checks required and ranged fields, then calls the store. Storage and
//! cursor failures are logged with their cause and surface as a generic
//! `internal` error.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use iotstore_core::time::is_storable;
use iotstore_events::{EventStore, MAX_PAGE_SIZE, ReadQuery, StoreError, resolve_page_size};

use crate::datastore::Datastore;
use crate::errors::RpcError;
use crate::types::{EncryptedEvent, ReadRequest, ReadResponse, WriteRequest, WriteResponse};

const YEAR_RANGE: &str = "must be between years 0000 and 9999";

/// Adapter from the RPC contract to [`EventStore`].
pub struct DatastoreService {
    store: Arc<EventStore>,
    verbose: bool,
}

impl DatastoreService {
    /// Wrap a started store. With `verbose`, every request is logged at info.
    pub fn new(store: Arc<EventStore>, verbose: bool) -> Self {
        Self { store, verbose }
    }

    /// The wrapped store.
    pub fn store(&self) -> &Arc<EventStore> {
        &self.store
    }
}

#[async_trait]
impl Datastore for DatastoreService {
    #[instrument(skip_all, fields(method = "WriteData"))]
    async fn write_data(
        &self,
        cancel: &CancellationToken,
        request: WriteRequest,
    ) -> Result<WriteResponse, RpcError> {
        if request.partition_key.is_empty() {
            return Err(RpcError::required("partitionKey"));
        }
        if request.device_token.is_empty() {
            return Err(RpcError::required("deviceToken"));
        }

        if self.verbose {
            info!(
                partition_key = %request.partition_key,
                bytes = request.data.len(),
                "WriteData"
            );
        }

        let _ = self
            .store
            .write_event(cancel, &request.partition_key, &request.data, &request.device_token)
            .await
            .map_err(|e| map_store_error("WriteData", e))?;

        Ok(WriteResponse {})
    }

    #[instrument(skip_all, fields(method = "ReadData"))]
    async fn read_data(
        &self,
        cancel: &CancellationToken,
        request: ReadRequest,
    ) -> Result<ReadResponse, RpcError> {
        if request.partition_key.is_empty() {
            return Err(RpcError::required("partitionKey"));
        }
        let page_size = resolve_page_size(request.page_size)
            .map_err(|_| RpcError::invalid("pageSize", format!("must be between 1 and {MAX_PAGE_SIZE}")))?;
        let start_time = request
            .start_time
            .ok_or_else(|| RpcError::required("startTime"))?;
        if !is_storable(&start_time) {
            return Err(RpcError::invalid("startTime", YEAR_RANGE));
        }
        if request.end_time.is_some_and(|end| !is_storable(&end)) {
            return Err(RpcError::invalid("endTime", YEAR_RANGE));
        }
        if request.end_time.is_some_and(|end| end < start_time) {
            return Err(RpcError::invalid("endTime", "must be after startTime"));
        }

        if self.verbose {
            info!(
                partition_key = %request.partition_key,
                page_size,
                start_time = %start_time,
                end_time = ?request.end_time,
                "ReadData"
            );
        }

        let query = ReadQuery {
            partition_key: request.partition_key,
            page_size,
            start_time,
            end_time: request.end_time,
            cursor: Some(request.page_cursor).filter(|cursor| !cursor.is_empty()),
        };
        let page = self
            .store
            .read_events(cancel, &query)
            .await
            .map_err(|e| map_store_error("ReadData", e))?;

        Ok(ReadResponse {
            partition_key: query.partition_key,
            events: page
                .events
                .into_iter()
                .map(|event| EncryptedEvent {
                    event_time: event.recorded_at,
                    data: event.data,
                })
                .collect(),
            page_size,
            next_page_cursor: page.next_cursor.unwrap_or_default(),
        })
    }
}

/// Translate a store failure into the RPC vocabulary.
fn map_store_error(method: &'static str, err: StoreError) -> RpcError {
    match err {
        StoreError::Cancelled => RpcError::Cancelled,
        StoreError::Validation { field, message } => RpcError::invalid(wire_argument(field), message),
        other => {
            error!(method, error = %other, kind = ?other.kind(), "request failed");
            RpcError::internal()
        }
    }
}

fn wire_argument(field: &'static str) -> &'static str {
    match field {
        "partition_key" => "partitionKey",
        "device_token" => "deviceToken",
        "page_size" => "pageSize",
        "start_time" => "startTime",
        "end_time" => "endTime",
        other => other,
    }
}
