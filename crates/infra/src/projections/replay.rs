//! Projection replay from the event store.
//!
//! Re-reads every stream of a type and pushes its events through an
//! [`EventDispatcher`]. Projectors skip positions they already applied, so a
//! replay over a live projection only fills gaps; to rebuild from scratch,
//! clear the read model and its positions first.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use sharedkernel_events::{DispatchError, EventDispatcher};

use crate::event_store::{EventStore, EventStoreError};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Counters of a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub streams: u64,
    pub events: u64,
    /// Listener deliveries that changed a read model.
    pub applied: u64,
}

/// Replay every stream of `stream_type` in stream id order.
///
/// Stops at the first dispatch failure; positions recorded before the
/// failure stay recorded, so a later replay resumes where this one stopped.
pub fn replay_streams<S, E>(
    store: &S,
    stream_type: &str,
    dispatcher: &mut EventDispatcher<E>,
) -> Result<ReplayReport, ReplayError>
where
    S: EventStore + ?Sized,
    E: 'static,
{
    let mut report = ReplayReport::default();

    for stream in store.get_streams_by_type(stream_type)? {
        let events = store.get_all(stream.stream_id, 0)?;
        report.applied += dispatcher.dispatch_all(&events)? as u64;
        report.events += events.len() as u64;
        report.streams += 1;
    }

    info!(
        stream_type,
        streams = report.streams,
        events = report.events,
        applied = report.applied,
        "replay complete"
    );
    Ok(report)
}
