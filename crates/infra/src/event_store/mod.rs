//! Append-only event store boundary.
//!
//! Streams are keyed by stream id (one per aggregate instance). The store
//! assigns positions; callers only state which version they loaded.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, Stream, UncommittedEvent};
