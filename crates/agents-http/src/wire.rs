//! Request and response envelopes that exist only on the wire.
//!
//! Domain records (`Run`, `RunStep`, ...) deserialise directly from response
//! bodies; the types here cover request bodies, list pages and error bodies.

use agents::{AgentId, MessageRole};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct CreateMessageRequest<'a> {
    pub role: MessageRole,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub assistant_id: &'a AgentId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TelemetryResponse {
    #[serde(default)]
    pub connection_string: Option<String>,
}

/// One page of a cursor-paginated list.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

/// `{ "error": { "code": ..., "message": ... } }`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
