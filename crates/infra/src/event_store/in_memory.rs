use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use sharedkernel_events::Event;

use super::r#trait::{EventStore, EventStoreError, Stream, UncommittedEvent};

#[derive(Debug)]
struct StreamRecord {
    stream: Stream,
    events: Vec<Event>,
}

/// In-memory append-only event store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<Uuid, StreamRecord>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching_streams<F>(&self, predicate: F) -> Result<Vec<Stream>, EventStoreError>
    where
        F: Fn(&Stream) -> bool,
    {
        let streams = self.streams.read().map_err(|_| EventStoreError::Poisoned)?;
        let mut found: Vec<Stream> = streams
            .values()
            .map(|record| &record.stream)
            .filter(|stream| predicate(stream))
            .cloned()
            .collect();
        found.sort_by_key(|stream| stream.stream_id);
        Ok(found)
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        stream: &Stream,
        events: Vec<UncommittedEvent>,
        correlation_id: Uuid,
    ) -> Result<u64, EventStoreError> {
        if events.is_empty() {
            return Ok(stream.version);
        }
        if stream.stream_type.is_empty() {
            return Err(EventStoreError::InvalidAppend(format!(
                "stream {} has no stream type",
                stream.stream_id
            )));
        }

        let mut streams = self.streams.write().map_err(|_| EventStoreError::Poisoned)?;

        if let Some(existing) = streams.get(&stream.stream_id) {
            if existing.stream.version != stream.version {
                return Err(EventStoreError::Concurrency {
                    stream_id: stream.stream_id,
                    expected: stream.version,
                    actual: existing.stream.version,
                });
            }
            // Enforce stream type stability.
            if existing.stream.stream_type != stream.stream_type {
                return Err(EventStoreError::StreamTypeMismatch {
                    stream_id: stream.stream_id,
                    existing: existing.stream.stream_type.clone(),
                    attempted: stream.stream_type.clone(),
                });
            }
        } else if stream.version != 0 {
            return Err(EventStoreError::Concurrency {
                stream_id: stream.stream_id,
                expected: stream.version,
                actual: 0,
            });
        }

        let record = streams.entry(stream.stream_id).or_insert_with(|| StreamRecord {
            stream: Stream::new(stream.stream_id, stream.stream_type.clone(), stream.slug.clone(), 0),
            events: Vec::new(),
        });

        let created = Utc::now();
        let mut next = record.stream.version;
        for e in events {
            next += 1;
            record.events.push(Event {
                event_id: e.event_id,
                event_type: e.event_type,
                position: next,
                data: e.data,
                stream_id: stream.stream_id,
                stream_type: stream.stream_type.clone(),
                version: next,
                created,
                correlation_id,
            });
        }

        record.stream.version = next;
        record.stream.slug = stream.slug.clone();
        Ok(next)
    }

    fn get_all(&self, stream_id: Uuid, from_version: u64) -> Result<Vec<Event>, EventStoreError> {
        let streams = self.streams.read().map_err(|_| EventStoreError::Poisoned)?;

        Ok(streams
            .get(&stream_id)
            .map(|record| {
                record
                    .events
                    .iter()
                    .filter(|e| e.version > from_version)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_last(&self, stream_id: Uuid, types: &[&str]) -> Result<Option<Event>, EventStoreError> {
        let streams = self.streams.read().map_err(|_| EventStoreError::Poisoned)?;

        Ok(streams.get(&stream_id).and_then(|record| {
            record
                .events
                .iter()
                .rev()
                .find(|e| types.contains(&e.event_type.as_str()))
                .cloned()
        }))
    }

    fn get_stream(&self, stream_id: Uuid) -> Result<Option<Stream>, EventStoreError> {
        let streams = self.streams.read().map_err(|_| EventStoreError::Poisoned)?;
        Ok(streams.get(&stream_id).map(|record| record.stream.clone()))
    }

    fn get_streams_by_slug(&self, slug: &str, stream_type: &str) -> Result<Vec<Stream>, EventStoreError> {
        self.matching_streams(|s| s.slug == slug && s.stream_type == stream_type)
    }

    fn get_streams_by_type(&self, stream_type: &str) -> Result<Vec<Stream>, EventStoreError> {
        self.matching_streams(|s| s.stream_type == stream_type)
    }
}
