//! Event-sourced aggregate persistence.
//!
//! ```text
//! load:  EventStore::get_all → MappingPipeline → Aggregate::load
//! save:  Aggregate::changes → EventStore::append → Aggregate::clear_events
//! ```
//!
//! The stream version passed to `append` is the version the aggregate had when
//! loaded (current version minus pending changes), so a concurrent writer
//! makes `save` fail with [`RepositoryError::Store`] wrapping
//! [`EventStoreError::Concurrency`]. Callers retry by reloading.

use std::marker::PhantomData;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use sharedkernel_core::{Aggregate, DomainError};
use sharedkernel_events::MappingPipeline;

use crate::event_store::{EventStore, EventStoreError, Stream, UncommittedEvent};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// Replaying the stored history failed (e.g. an unknown event).
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("stream {stream_id} has type '{found}', expected '{expected}'")]
    WrongStreamType {
        stream_id: Uuid,
        expected: &'static str,
        found: String,
    },

    #[error("No Event Mapper was found for event {event_type}.")]
    MapperNotFound { event_type: String },

    #[error("failed to map stored event {event_type}: {source}")]
    Mapping {
        event_type: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("stored event {event_type} carries an undecodable payload: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads and saves aggregates of type `A` through an [`EventStore`].
pub struct EventSourcedRepository<S, A>
where
    A: Aggregate,
{
    store: S,
    mappers: MappingPipeline<A::Event>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<S, A> EventSourcedRepository<S, A>
where
    S: EventStore,
    A: Aggregate,
    A::Event: Serialize,
    A::Id: Copy + Into<Uuid>,
{
    /// `mappers` must map every event type `A` has ever stored.
    pub fn new(store: S, mappers: MappingPipeline<A::Event>) -> Self {
        Self {
            store,
            mappers,
            _aggregate: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuild the aggregate from its stream; `None` if the stream does not exist.
    pub fn load(&self, id: A::Id) -> Result<Option<A>, RepositoryError> {
        let stream_id: Uuid = id.into();
        let Some(stream) = self.store.get_stream(stream_id)? else {
            return Ok(None);
        };
        if stream.stream_type != A::TYPE {
            return Err(RepositoryError::WrongStreamType {
                stream_id,
                expected: A::TYPE,
                found: stream.stream_type,
            });
        }

        let mut history = Vec::new();
        for stored in self.store.get_all(stream_id, 0)? {
            let data = stored.payload().map_err(|source| RepositoryError::Payload {
                event_type: stored.event_type.clone(),
                source,
            })?;
            let event = self
                .mappers
                .map(&data, &stored.event_type)
                .map_err(|source| RepositoryError::Mapping {
                    event_type: stored.event_type.clone(),
                    source,
                })?
                .ok_or_else(|| RepositoryError::MapperNotFound {
                    event_type: stored.event_type.clone(),
                })?;
            history.push(event);
        }

        let aggregate = A::load(id, history)?;
        debug!(stream_type = A::TYPE, %stream_id, version = aggregate.version(), "aggregate loaded");
        Ok(Some(aggregate))
    }

    /// Append the pending changes, then clear them.
    ///
    /// Returns the stream version after the append. With no pending changes
    /// nothing is written and the current version is returned.
    pub fn save(&self, aggregate: &mut A, correlation_id: Uuid) -> Result<u64, RepositoryError> {
        let changes = aggregate.changes();
        if changes.is_empty() {
            return Ok(aggregate.version());
        }

        let stream_id: Uuid = (*aggregate.id()).into();
        let loaded_version = aggregate.version() - changes.len() as u64;
        let stream = Stream::new(stream_id, A::TYPE, aggregate.slug(), loaded_version);
        let uncommitted = changes
            .iter()
            .map(UncommittedEvent::from_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let count = uncommitted.len();

        let version = self.store.append(&stream, uncommitted, correlation_id)?;
        aggregate.clear_events();

        info!(
            stream_type = A::TYPE,
            %stream_id,
            %correlation_id,
            events = count,
            version,
            "aggregate saved"
        );
        Ok(version)
    }
}

impl<S, A> core::fmt::Debug for EventSourcedRepository<S, A>
where
    S: core::fmt::Debug,
    A: Aggregate,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventSourcedRepository")
            .field("aggregate", &A::TYPE)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
