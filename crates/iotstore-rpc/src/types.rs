//! Wire types: the Datastore messages and the generic `/rpc` envelope.
//!
//! Fields are lowerCamelCase, timestamps RFC 3339 and bytes standard base64.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Datastore messages ──────────────────────────────────────────────

/// `WriteData` request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteRequest {
    /// Owner of the event. `publicKey` is accepted for older clients.
    #[serde(alias = "publicKey")]
    pub partition_key: String,
    /// Opaque encrypted payload.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// Token of the writing device.
    pub device_token: String,
}

/// `WriteData` response. Always empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {}

/// `ReadData` request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadRequest {
    /// Partition to read. `publicKey` is accepted for older clients.
    #[serde(alias = "publicKey")]
    pub partition_key: String,
    /// 0 means the default page size.
    pub page_size: i64,
    /// Inclusive lower bound. Required.
    pub start_time: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub end_time: Option<DateTime<Utc>>,
    /// `nextPageCursor` from the previous page; empty for the first page.
    pub page_cursor: String,
}

/// One event as returned to readers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEvent {
    /// When the store recorded the event.
    pub event_time: DateTime<Utc>,
    /// Opaque payload.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// `ReadData` response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadResponse {
    /// Echo of the requested partition.
    pub partition_key: String,
    /// Events in time order.
    pub events: Vec<EncryptedEvent>,
    /// Page size actually applied.
    pub page_size: u32,
    /// Token for the next page; empty when there is none.
    pub next_page_cursor: String,
}

// ── Envelope ────────────────────────────────────────────────────────

/// Request posted to `/rpc`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Caller-chosen identifier, echoed back.
    pub id: String,
    /// Method name (`WriteData`, `ReadData`).
    pub method: String,
    /// Method request object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Response to an [`RpcRequest`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Echoed request identifier.
    pub id: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Method response (present when `success == true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload (present when `success == false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
}

impl RpcResponse {
    /// Build a success response.
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn failure(id: impl Into<String>, error: RpcErrorBody) -> Self {
        Self {
            id: id.into(),
            success: false,
            result: None,
            error: Some(error),
        }
    }
}

/// Error inside an [`RpcResponse`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Extra context such as the offending `argument`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// Error body of a failed `/twirp/...` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwirpErrorBody {
    /// Twirp error code.
    pub code: String,
    /// Human-readable message.
    pub msg: String,
    /// Extra context such as the offending `argument`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
