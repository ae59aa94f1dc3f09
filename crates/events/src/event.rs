//! Infrastructure event record.
//!
//! This is the wire/storage shape of a domain event: stream metadata plus a
//! serialized payload. Domain code never sees it; the dispatcher maps it into a
//! typed domain event first.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

/// A stored/published event.
///
/// Notes:
/// - **Append-only**: `position` is monotonically increasing within the stream.
/// - `data` is the serialized payload; brokers commonly double-encode it (a JSON
///   string holding JSON text), see [`extract`].
/// - `version` is the owning aggregate's version at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub event_type: String,

    /// Monotonically increasing position in the owning stream.
    pub position: u64,
    pub data: String,

    pub stream_id: Uuid,
    pub stream_type: String,
    pub version: u64,

    pub created: DateTime<Utc>,
    pub correlation_id: Uuid,
}

/// Failure to decode a broker message into an [`Event`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed event message: {0}")]
    Message(#[from] serde_json::Error),

    #[error("invalid `created` timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Message layout produced by the event relay (`id`/`type` instead of `event_*`).
#[derive(Debug, Deserialize)]
struct BrokerMessage {
    id: Uuid,
    #[serde(rename = "type")]
    event_type: String,
    position: u64,
    data: String,
    stream_id: Uuid,
    stream_type: String,
    version: u64,
    created: String,
    correlation_id: Uuid,
}

impl Event {
    /// Decode a broker message (`id`, `type`, `position`, `data`, `stream_id`,
    /// `stream_type`, `version`, `created`, `correlation_id`).
    pub fn from_message(message: &JsonValue) -> Result<Self, DecodeError> {
        let msg = BrokerMessage::deserialize(message)?;
        let created = parse_timestamp(&msg.created)?;

        Ok(Self {
            event_id: msg.id,
            event_type: msg.event_type,
            position: msg.position,
            data: msg.data,
            stream_id: msg.stream_id,
            stream_type: msg.stream_type,
            version: msg.version,
            created,
            correlation_id: msg.correlation_id,
        })
    }

    /// Payload as JSON, unwrapping one level of string encoding if present.
    pub fn payload(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::from_str(&extract(&self.data))
    }
}

/// Unwrap a double-encoded JSON payload.
///
/// `"{\"a\": 1}"` (a JSON string literal) becomes `{"a": 1}`; anything that is
/// not a JSON string literal is returned unchanged.
pub fn extract(data: &str) -> Cow<'_, str> {
    match serde_json::from_str::<String>(data) {
        Ok(inner) => Cow::Owned(inner),
        Err(_) => Cow::Borrowed(data),
    }
}

/// Accepts RFC 3339 and the Postgres text form (`2024-06-08 14:56:28.542193+00`).
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DecodeError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z")
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| DecodeError::Timestamp {
            value: value.to_string(),
            source,
        })
}
