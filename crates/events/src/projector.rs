//! Ordering and idempotence guard around a projection.
//!
//! Delivery is at-least-once, so the same event may arrive several times, but
//! per entity it must arrive in stream order. For each incoming event the
//! projector compares its position with the projection's recorded position:
//!
//! | incoming position       | decision                                   |
//! |-------------------------|--------------------------------------------|
//! | `<= current`            | already applied: skip, nothing is written  |
//! | `== current + 1`        | apply, then record `position`              |
//! | `> current + 1`         | [`ProjectionError::OutOfOrderEvent`]       |
//!
//! The check, the apply and the position update are not atomic here. When
//! several workers can deliver events for the same entity, the host must
//! serialize delivery per entity or wrap `process` in a transaction shared
//! with the projection's storage.

use tracing::{debug, error, info};

use sharedkernel_core::DomainEvent;

use crate::projection::{Projection, ProjectionError};

/// What [`Projector::process`] did with an event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The projection applied the event and its position was recorded.
    Applied,
    /// The position was already applied; the event was skipped.
    AlreadyApplied,
}

/// Wraps a projection and decides, per event, whether to apply, skip or reject it.
#[derive(Debug)]
pub struct Projector<P>
where
    P: Projection,
{
    projection: P,
}

impl<P> Projector<P>
where
    P: Projection,
{
    pub fn new(projection: P) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn projection_mut(&mut self) -> &mut P {
        &mut self.projection
    }

    pub fn into_projection(self) -> P {
        self.projection
    }

    /// Qualified names of the events the wrapped projection declares.
    pub fn handles(&self) -> &'static [&'static str] {
        P::HANDLES
    }

    /// Project `event`, found at `position` in the stream of `entity_id`.
    ///
    /// [`DomainError::UnknownEvent`](sharedkernel_core::DomainError::UnknownEvent)
    /// from the projection propagates unchanged and leaves the position as is.
    pub fn process(
        &mut self,
        event: &P::Event,
        position: u64,
        entity_id: &P::Id,
    ) -> Result<ProcessOutcome, ProjectionError> {
        let event_type = event.qualname();
        let current = self.projection.get_position(entity_id, event_type)?;

        if position <= current {
            debug!(
                projection = P::NAME,
                %entity_id,
                event_type,
                position,
                current,
                "event position already applied; skipping"
            );
            return Ok(ProcessOutcome::AlreadyApplied);
        }

        if position - current > 1 {
            let expected = current + 1;
            error!(
                projection = P::NAME,
                %entity_id,
                event_type,
                position,
                expected,
                "event position is out of order"
            );
            return Err(ProjectionError::OutOfOrderEvent {
                projection: P::NAME,
                entity_id: entity_id.to_string(),
                event_type: event_type.to_string(),
                position,
                expected,
            });
        }

        self.projection.apply(event)?;
        info!(projection = P::NAME, %entity_id, event_type, position, "event projected");

        self.projection.update_position(entity_id, event_type, position)?;
        debug!(projection = P::NAME, %entity_id, event_type, position, "projection position updated");

        Ok(ProcessOutcome::Applied)
    }
}
