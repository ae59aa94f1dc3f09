//! Infrastructure layer: reference event store, position store and
//! aggregate persistence.
//!
//! Everything here is in-memory and meant for tests/dev; production hosts
//! implement [`event_store::EventStore`] and
//! [`PositionStore`](sharedkernel_events::PositionStore) over their own
//! storage.

pub mod event_store;
pub mod projections;
pub mod repository;

pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, Stream, UncommittedEvent};
pub use projections::{InMemoryPositionStore, PositionScope, ReplayError, ReplayReport, replay_streams};
pub use repository::{EventSourcedRepository, RepositoryError};

mod integration_tests;
