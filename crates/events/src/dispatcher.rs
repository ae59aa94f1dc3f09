//! Infrastructure event → projector fan-out.
//!
//! The dispatcher owns its listeners. Routing is built at subscribe time from
//! each listener's declared `handles` set, so an event whose type nobody
//! handles is dropped before its payload is even decoded.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, debug_span};
use uuid::Uuid;

use crate::event::Event;
use crate::mapping::MappingPipeline;
use crate::projection::{Projection, ProjectionError};
use crate::projector::{ProcessOutcome, Projector};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Subscribing a listener that declares no handled event type.
    #[error("Cannot subscribe `{listener}` because it does not handle any event")]
    UnprocessableListener { listener: String },

    /// A listener exists for the event type but no mapper can build the event.
    #[error("No Event Mapper was found for event {event_type}.")]
    MapperNotFound { event_type: String },

    /// A mapper matched but failed to build the event.
    #[error("failed to map event {event_type}: {source}")]
    Mapping {
        event_type: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("event {event_type} carries an undecodable payload: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// A subscriber of the [`EventDispatcher`].
///
/// Implemented for every [`Projector`] whose entity id can be built from a
/// stream id.
pub trait Listener<E>: Send {
    fn name(&self) -> &str;

    /// Event type names this listener wants to receive.
    fn handles(&self) -> &[&'static str];

    fn process(
        &mut self,
        event: &E,
        position: u64,
        entity_id: Uuid,
    ) -> Result<ProcessOutcome, ProjectionError>;
}

impl<P> Listener<P::Event> for Projector<P>
where
    P: Projection + Send,
    P::Id: From<Uuid>,
{
    fn name(&self) -> &str {
        P::NAME
    }

    fn handles(&self) -> &[&'static str] {
        P::HANDLES
    }

    fn process(
        &mut self,
        event: &P::Event,
        position: u64,
        entity_id: Uuid,
    ) -> Result<ProcessOutcome, ProjectionError> {
        Projector::process(self, event, position, &P::Id::from(entity_id))
    }
}

/// Routes [`Event`] records to the listeners subscribed to their type.
pub struct EventDispatcher<E> {
    pipeline: MappingPipeline<E>,
    listeners: Vec<Box<dyn Listener<E>>>,
    routes: HashMap<String, Vec<usize>>,
}

impl<E: 'static> EventDispatcher<E> {
    pub fn new(pipeline: MappingPipeline<E>) -> Self {
        Self {
            pipeline,
            listeners: Vec::new(),
            routes: HashMap::new(),
        }
    }

    /// Register `listener` for every event type it handles.
    pub fn subscribe(&mut self, listener: impl Listener<E> + 'static) -> Result<(), DispatchError> {
        if listener.handles().is_empty() {
            return Err(DispatchError::UnprocessableListener {
                listener: listener.name().to_string(),
            });
        }

        let index = self.listeners.len();
        for event_type in listener.handles() {
            let route = self.routes.entry((*event_type).to_string()).or_default();
            if !route.contains(&index) {
                route.push(index);
            }
        }
        debug!(listener = listener.name(), handles = ?listener.handles(), "listener subscribed");

        self.listeners.push(Box::new(listener));
        Ok(())
    }

    /// Number of listeners subscribed to `event_type`.
    pub fn subscribers(&self, event_type: &str) -> usize {
        self.routes.get(event_type).map_or(0, Vec::len)
    }

    /// Map `event` and deliver it to its listeners, in subscription order.
    ///
    /// Returns how many listeners applied the event (skipped redeliveries are
    /// not counted). The first listener error stops delivery.
    pub fn dispatch(&mut self, event: &Event) -> Result<usize, DispatchError> {
        let span = debug_span!(
            "dispatch",
            correlation_id = %event.correlation_id,
            event_id = %event.event_id,
            event_type = %event.event_type,
        );
        let _guard = span.enter();

        let Some(route) = self.routes.get(&event.event_type) else {
            debug!(position = event.position, "no listener subscribed; skipping");
            return Ok(0);
        };

        let data = event.payload().map_err(|source| DispatchError::Payload {
            event_type: event.event_type.clone(),
            source,
        })?;

        let domain_event = self
            .pipeline
            .map(&data, &event.event_type)
            .map_err(|source| DispatchError::Mapping {
                event_type: event.event_type.clone(),
                source,
            })?
            .ok_or_else(|| DispatchError::MapperNotFound {
                event_type: event.event_type.clone(),
            })?;

        let mut applied = 0;
        for &index in route {
            let Some(listener) = self.listeners.get_mut(index) else {
                continue;
            };
            let outcome = listener.process(&domain_event, event.position, event.stream_id)?;
            if outcome == ProcessOutcome::Applied {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Dispatch `events` in order, stopping at the first failure.
    pub fn dispatch_all<'a, I>(&mut self, events: I) -> Result<usize, DispatchError>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut applied = 0;
        for event in events {
            applied += self.dispatch(event)?;
        }
        Ok(applied)
    }
}

impl<E> core::fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.iter().map(|l| l.name()).collect::<Vec<_>>())
            .field("routes", &self.routes)
            .finish()
    }
}
