//! `sharedkernel-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, entities, value objects, domain events, the event-sourced
//! aggregate state machine, guard clauses and query-side read models.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod guard;
pub mod id;
pub mod read_model;
pub mod value_object;

pub use aggregate::{Aggregate, EventBuffer};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, ErrorInfo};
pub use event::DomainEvent;
pub use guard::Guard;
pub use read_model::{ReadModel, ReadModelList};
pub use value_object::ValueObject;

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use uuid::Uuid;
}
