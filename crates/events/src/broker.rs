//! In-process domain event broker.
//!
//! Handlers subscribe to the qualified names of the events they process and
//! are notified synchronously when such an event is published. Unlike the
//! [`EventDispatcher`](crate::EventDispatcher) there is no mapping step and no
//! position tracking: the broker works on domain events raised in the same
//! process.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use sharedkernel_core::DomainEvent;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("handler `{handler}` failed to process {event_type}: {source}")]
    Handler {
        handler: String,
        event_type: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Reacts to published domain events.
pub trait DomainEventHandler<E>: Send {
    /// Qualified names of the events this handler processes.
    fn handles(&self) -> &[&'static str];

    fn process(&mut self, event: &E) -> anyhow::Result<()>;

    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

/// Notifies subscribed handlers of published domain events.
pub struct EventBroker<E> {
    handlers: Vec<Box<dyn DomainEventHandler<E>>>,
    consumers: HashMap<&'static str, Vec<usize>>,
}

impl<E> EventBroker<E>
where
    E: DomainEvent,
{
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            consumers: HashMap::new(),
        }
    }

    /// Returns `false` (and drops the handler) when it declares no event.
    pub fn subscribe(&mut self, handler: impl DomainEventHandler<E> + 'static) -> bool {
        if handler.handles().is_empty() {
            debug!(handler = handler.name(), "handler declares no event; not subscribed");
            return false;
        }

        let index = self.handlers.len();
        for &event_type in handler.handles() {
            let group = self.consumers.entry(event_type).or_default();
            if !group.contains(&index) {
                group.push(index);
            }
        }
        self.handlers.push(Box::new(handler));
        true
    }

    /// Run every handler subscribed to the event's type, in subscription order.
    ///
    /// Returns the number of handlers notified. The first handler error aborts
    /// publication; handlers after it are not called.
    pub fn publish(&mut self, event: &E) -> Result<usize, BrokerError> {
        let event_type = event.qualname();
        let Some(group) = self.consumers.get(event_type) else {
            return Ok(0);
        };

        for &index in group {
            let Some(handler) = self.handlers.get_mut(index) else {
                continue;
            };
            handler.process(event).map_err(|source| BrokerError::Handler {
                handler: handler.name().to_string(),
                event_type,
                source,
            })?;
        }
        Ok(group.len())
    }
}

impl<E: DomainEvent> Default for EventBroker<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> core::fmt::Debug for EventBroker<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBroker")
            .field("consumers", &self.consumers)
            .finish_non_exhaustive()
    }
}
