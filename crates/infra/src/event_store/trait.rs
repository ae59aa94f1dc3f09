use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use sharedkernel_core::DomainEvent;
use sharedkernel_events::Event;

/// Stream header: one stream per aggregate instance.
///
/// `version` is the number of events in the stream. When passed to
/// [`EventStore::append`] it is the version the caller loaded (the expected
/// version for the optimistic concurrency check).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stream {
    pub stream_id: Uuid,
    pub stream_type: String,
    /// Human-readable identifier (e.g. a username); not unique.
    pub slug: String,
    pub version: u64,
}

impl Stream {
    pub fn new(
        stream_id: Uuid,
        stream_type: impl Into<String>,
        slug: impl Into<String>,
        version: u64,
    ) -> Self {
        Self {
            stream_id,
            stream_type: stream_type.into(),
            slug: slug.into(),
            version,
        }
    }
}

/// A domain event ready to be appended (no position assigned yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub event_type: String,
    /// Serialized payload (JSON text).
    pub data: String,
}

impl UncommittedEvent {
    /// Serialize a domain event; its qualified name becomes the event type.
    pub fn from_domain<E>(event: &E) -> Result<Self, EventStoreError>
    where
        E: DomainEvent + Serialize,
    {
        Ok(Self {
            event_id: Uuid::now_v7(),
            event_type: event.qualname().to_string(),
            data: serde_json::to_string(event)?,
        })
    }
}

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("optimistic concurrency check failed for stream {stream_id}: expected version {expected}, found {actual}")]
    Concurrency {
        stream_id: Uuid,
        expected: u64,
        actual: u64,
    },

    #[error("stream {stream_id} has type '{existing}', attempted append with '{attempted}'")]
    StreamTypeMismatch {
        stream_id: Uuid,
        existing: String,
        attempted: String,
    },

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("event store lock poisoned")]
    Poisoned,
}

/// Append-only event store.
///
/// Within a stream, positions and versions coincide: the n-th event ever
/// appended has `position == version == n`. Reads return events in position
/// order.
pub trait EventStore: Send + Sync {
    /// Append `events` to `stream`, returning the position of the last one.
    ///
    /// Implementations must:
    /// - fail with [`EventStoreError::Concurrency`] unless the stored version
    ///   equals `stream.version` (a missing stream has version `0`)
    /// - keep the stream type stable ([`EventStoreError::StreamTypeMismatch`])
    /// - assign positions `stream.version + 1 ..` and persist all events or none
    fn append(
        &self,
        stream: &Stream,
        events: Vec<UncommittedEvent>,
        correlation_id: Uuid,
    ) -> Result<u64, EventStoreError>;

    /// Events of `stream_id` with a version greater than `from_version`.
    fn get_all(&self, stream_id: Uuid, from_version: u64) -> Result<Vec<Event>, EventStoreError>;

    /// Latest event of `stream_id` whose type is one of `types`.
    fn get_last(&self, stream_id: Uuid, types: &[&str]) -> Result<Option<Event>, EventStoreError>;

    fn get_stream(&self, stream_id: Uuid) -> Result<Option<Stream>, EventStoreError>;

    fn get_streams_by_slug(&self, slug: &str, stream_type: &str) -> Result<Vec<Stream>, EventStoreError>;

    fn get_streams_by_type(&self, stream_type: &str) -> Result<Vec<Stream>, EventStoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(
        &self,
        stream: &Stream,
        events: Vec<UncommittedEvent>,
        correlation_id: Uuid,
    ) -> Result<u64, EventStoreError> {
        (**self).append(stream, events, correlation_id)
    }

    fn get_all(&self, stream_id: Uuid, from_version: u64) -> Result<Vec<Event>, EventStoreError> {
        (**self).get_all(stream_id, from_version)
    }

    fn get_last(&self, stream_id: Uuid, types: &[&str]) -> Result<Option<Event>, EventStoreError> {
        (**self).get_last(stream_id, types)
    }

    fn get_stream(&self, stream_id: Uuid) -> Result<Option<Stream>, EventStoreError> {
        (**self).get_stream(stream_id)
    }

    fn get_streams_by_slug(&self, slug: &str, stream_type: &str) -> Result<Vec<Stream>, EventStoreError> {
        (**self).get_streams_by_slug(slug, stream_type)
    }

    fn get_streams_by_type(&self, stream_type: &str) -> Result<Vec<Stream>, EventStoreError> {
        (**self).get_streams_by_type(stream_type)
    }
}
