//! HTTP handlers.
//!
//! - `POST /twirp/decode.iot.datastore.Datastore/{method}`: Twirp JSON
//! - `POST /rpc`: JSON envelope `{id, method, params}`
//! - `GET /pulse`: database liveness
//! - `GET /metrics`: Prometheus exposition

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;
use tracing::error;

use iotstore_rpc::{RpcError, RpcRequest, RpcResponse};

use crate::server::AppState;

/// Twirp route, `{method}` being `WriteData` or `ReadData`.
pub const TWIRP_ROUTE: &str = "/twirp/decode.iot.datastore.Datastore/{method}";

/// Body returned by `/pulse` when the database is unreachable.
pub const PULSE_FAILURE: &str = "failed to connect to DB";

/// POST /twirp/decode.iot.datastore.Datastore/{method}
pub async fn twirp_handler(
    State(state): State<AppState>,
    Path(method): Path<String>,
    body: Bytes,
) -> Response {
    let result = match parse_params(&body) {
        Ok(params) => state.registry.call(&method, params, &state.rpc).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => twirp_error(&err),
    }
}

/// POST /rpc
pub async fn rpc_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let err = RpcError::Malformed {
                message: format!("invalid request envelope: {e}"),
            };
            let response = RpcResponse::failure("", err.to_error_body());
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };
    Json(state.registry.dispatch(request, &state.rpc).await).into_response()
}

/// GET /pulse
pub async fn pulse_handler(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(err) => {
            error!(error = %err, "pulse check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, PULSE_FAILURE).into_response()
        }
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            crate::metrics::render(handle),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// An empty body is treated as `{}`.
fn parse_params(body: &[u8]) -> Result<Option<Value>, RpcError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| RpcError::Malformed {
            message: format!("failed to parse request body: {e}"),
        })
}

fn twirp_error(err: &RpcError) -> Response {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_twirp_body())).into_response()
}
