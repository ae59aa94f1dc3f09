//! Read model mutators and their position tracking contract.
//!
//! A projection turns domain events into query-optimized state. It never
//! decides *whether* an event should be applied; the [`Projector`](crate::Projector)
//! does that by comparing the event's stream position with the last position the
//! projection recorded for the entity.
//!
//! Read models are **disposable**: they can be cleared and rebuilt from the
//! event log at any time. The position record is the only state that makes
//! redelivery idempotent, so it must be stored durably and, when several
//! workers may deliver events for the same entity, updated in the same
//! transaction as the read model itself.

use std::sync::Arc;

use thiserror::Error;

use sharedkernel_core::{DomainError, DomainEvent};

/// Position store failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionStoreError {
    /// Internal lock poisoning (in-memory stores).
    #[error("position store lock poisoned")]
    Poisoned,

    /// Backend failure (connection, transaction, ...).
    #[error("position store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while projecting an event.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The event skips at least one position for the entity.
    ///
    /// Fatal by design: an upstream gap needs a retry from the source or a
    /// rebuild, never in-process reordering.
    #[error(
        "{event_type} position {position} is out of order in projection '{projection}' for entity {entity_id} (expected {expected})"
    )]
    OutOfOrderEvent {
        projection: &'static str,
        entity_id: String,
        event_type: String,
        position: u64,
        expected: u64,
    },

    /// Includes [`DomainError::UnknownEvent`] raised by `apply`.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Position(#[from] PositionStoreError),

    /// Read model storage failure.
    #[error("read model update failed: {0}")]
    ReadModel(String),
}

impl ProjectionError {
    pub fn read_model(msg: impl Into<String>) -> Self {
        Self::ReadModel(msg.into())
    }
}

/// A projection builds a read model from domain events.
///
/// `apply` is a single exhaustive `match` over [`Self::Event`]: handled variants
/// update the read model, every other variant returns
/// [`DomainError::unknown_event`]. [`Self::HANDLES`] must list exactly the
/// qualified names of the handled variants; the dispatcher routes on it.
///
/// `get_position` must return `0` for an entity it has never seen, so that the
/// first event of a stream (position 1) is accepted.
pub trait Projection {
    /// Projection type name (logs, errors, position store key).
    const NAME: &'static str;

    /// Read model type tag.
    const MODEL_TYPE: &'static str;

    /// Qualified names of the events `apply` handles.
    const HANDLES: &'static [&'static str];

    type Event: DomainEvent;

    /// Entity identifier the read model is keyed by.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Mutate the read model for one event.
    fn apply(&mut self, event: &Self::Event) -> Result<(), ProjectionError>;

    /// Last applied position for `(entity_id, event_type)`, `0` if none.
    fn get_position(&self, entity_id: &Self::Id, event_type: &str) -> Result<u64, ProjectionError>;

    fn update_position(
        &mut self,
        entity_id: &Self::Id,
        event_type: &str,
        position: u64,
    ) -> Result<(), ProjectionError>;
}

/// Durable "last applied position" records, shared by every projector of a
/// projection type.
///
/// Keys are `(projection, entity_id, event_type)`. Implementations may ignore
/// `event_type` and track a single position per entity.
pub trait PositionStore: Send + Sync {
    /// Returns `0` when no position was recorded.
    fn get_position(
        &self,
        projection: &str,
        entity_id: &str,
        event_type: &str,
    ) -> Result<u64, PositionStoreError>;

    /// Insert or overwrite the recorded position.
    fn update_position(
        &self,
        projection: &str,
        entity_id: &str,
        event_type: &str,
        position: u64,
    ) -> Result<(), PositionStoreError>;
}

impl<S> PositionStore for Arc<S>
where
    S: PositionStore + ?Sized,
{
    fn get_position(
        &self,
        projection: &str,
        entity_id: &str,
        event_type: &str,
    ) -> Result<u64, PositionStoreError> {
        (**self).get_position(projection, entity_id, event_type)
    }

    fn update_position(
        &self,
        projection: &str,
        entity_id: &str,
        event_type: &str,
        position: u64,
    ) -> Result<(), PositionStoreError> {
        (**self).update_position(projection, entity_id, event_type, position)
    }
}
