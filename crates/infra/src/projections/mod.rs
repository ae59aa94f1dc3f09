//! Projection support: position persistence and replay.
//!
//! Projections are:
//! - **Rebuildable**: can be reconstructed from the event stream
//! - **Idempotent**: safe for at-least-once delivery

pub mod position_store;
pub mod replay;

pub use position_store::{InMemoryPositionStore, PositionScope};
pub use replay::{ReplayError, ReplayReport, replay_streams};
