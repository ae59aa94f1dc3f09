//! Event-sourced aggregate roots.
//!
//! An aggregate keeps its state consistent with the full history of events applied
//! to it and captures the events it raises until they are persisted.
//!
//! - **State mutation**: [`Aggregate::when`] is the one transition table per
//!   aggregate type. Events it does not declare fail with
//!   [`DomainError::UnknownEvent`]; they are never silently dropped.
//! - **Recording**: [`Aggregate::raise_event`] applies, then buffers the event.
//! - **Replay**: [`Aggregate::load`] applies history directly, so the buffer stays
//!   empty and nothing is persisted twice.

use crate::entity::Entity;
use crate::error::DomainResult;
use crate::event::DomainEvent;

/// Version counter + pending-events buffer embedded in every aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBuffer<E> {
    version: u64,
    pending: Vec<E>,
}

impl<E> EventBuffer<E> {
    pub fn new() -> Self {
        Self {
            version: 0,
            pending: Vec::new(),
        }
    }

    /// Number of events applied since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Raised events not yet persisted, in the order they were raised.
    pub fn pending(&self) -> &[E] {
        &self.pending
    }

    fn advance(&mut self) {
        self.version += 1;
    }

    fn record(&mut self, event: E) {
        self.pending.push(event);
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<E> Default for EventBuffer<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate execution semantics (pure, deterministic).
///
/// Implementors provide an empty pre-history state, access to their embedded
/// [`EventBuffer`] and the transition table; everything else is provided.
///
/// ```ignore
/// fn when(&mut self, event: &UserEvent) -> DomainResult<()> {
///     match event {
///         UserEvent::Registered(e) => self.name = e.name.clone(),
///         UserEvent::NameUpdated(e) => self.name = e.new_name.clone(),
///         other => return Err(DomainError::unknown_event(Self::TYPE, other.name())),
///     }
///     Ok(())
/// }
/// ```
///
/// Aggregates must not perform IO or side effects.
pub trait Aggregate: Entity + Sized {
    /// Stable aggregate type name, also used as the stream type.
    const TYPE: &'static str;

    type Event: DomainEvent;

    /// Version-0 state for `id`, before any event was applied.
    fn empty(id: Self::Id) -> Self;

    fn events(&self) -> &EventBuffer<Self::Event>;

    fn events_mut(&mut self) -> &mut EventBuffer<Self::Event>;

    /// Transition table: mutate state for one event.
    ///
    /// Must fail with [`DomainError::unknown_event`](crate::DomainError::unknown_event)
    /// for every event this aggregate does not handle, and must not touch state
    /// in that case.
    fn when(&mut self, event: &Self::Event) -> DomainResult<()>;

    /// Apply one event and advance the version. Nothing is recorded.
    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        self.when(event)?;
        self.events_mut().advance();
        Ok(())
    }

    /// Apply a new event and append it to the pending buffer.
    fn raise_event(&mut self, event: Self::Event) -> DomainResult<()> {
        self.apply(&event)?;
        self.events_mut().record(event);
        Ok(())
    }

    fn version(&self) -> u64 {
        self.events().version()
    }

    /// Pending events, in raise order, for the persistence collaborator.
    fn changes(&self) -> &[Self::Event] {
        self.events().pending()
    }

    /// Drop the pending events.
    ///
    /// Call only once the append has been durably committed: cleared events are
    /// gone from the buffer whether they were saved or not.
    fn clear_events(&mut self) {
        self.events_mut().clear();
    }

    /// Human-readable stream identifier.
    fn slug(&self) -> String {
        self.id().to_string()
    }

    /// Rebuild an aggregate by replaying its history.
    fn load<I>(id: Self::Id, history: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = Self::Event>,
    {
        let mut aggregate = Self::empty(id);
        for event in history {
            aggregate.apply(&event)?;
        }
        Ok(aggregate)
    }
}
