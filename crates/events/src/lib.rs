//! `sharedkernel-events`: event records, projections and event fan-out.
//!
//! Infrastructure events arrive as [`Event`] records, are mapped into typed
//! domain events by a [`MappingPipeline`] and delivered by the
//! [`EventDispatcher`] to [`Projector`]s, which apply each event to their
//! projection exactly once and in stream order.

pub mod broker;
pub mod dispatcher;
pub mod event;
pub mod mapping;
pub mod projection;
pub mod projector;

pub use broker::{BrokerError, DomainEventHandler, EventBroker};
pub use dispatcher::{DispatchError, EventDispatcher, Listener};
pub use event::{DecodeError, Event, extract};
pub use mapping::{FnMapper, JsonMapper, Mapper, MappersChain, MappingBehavior, MappingPipeline, mapper};
pub use projection::{PositionStore, PositionStoreError, Projection, ProjectionError};
pub use projector::{ProcessOutcome, Projector};
