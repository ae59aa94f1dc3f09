//! Projection position persistence.
//!
//! Tracks the last applied stream position per projection and entity so that
//! redelivered events are skipped and gaps are detected. Clearing a
//! projection's positions (together with its read model) triggers a rebuild
//! from position 1.

use std::collections::HashMap;
use std::sync::RwLock;

use sharedkernel_events::{PositionStore, PositionStoreError};

/// Granularity of the recorded positions.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PositionScope {
    /// One position per `(projection, entity, event type)`.
    #[default]
    PerEventType,
    /// One position per `(projection, entity)`; the event type is ignored.
    ///
    /// Use this when positions are numbered per stream (as the event store
    /// does) and a projection handles more than one event type.
    PerEntity,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PositionKey {
    projection: String,
    entity_id: String,
    event_type: Option<String>,
}

/// In-memory position store.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPositionStore {
    scope: PositionScope,
    positions: RwLock<HashMap<PositionKey, u64>>,
}

impl InMemoryPositionStore {
    pub fn new(scope: PositionScope) -> Self {
        Self {
            scope,
            positions: RwLock::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> PositionScope {
        self.scope
    }

    /// Forget every position recorded for `projection` (for rebuilds).
    pub fn clear(&self, projection: &str) -> Result<(), PositionStoreError> {
        let mut positions = self.positions.write().map_err(|_| PositionStoreError::Poisoned)?;
        positions.retain(|key, _| key.projection != projection);
        Ok(())
    }

    fn key(&self, projection: &str, entity_id: &str, event_type: &str) -> PositionKey {
        PositionKey {
            projection: projection.to_string(),
            entity_id: entity_id.to_string(),
            event_type: match self.scope {
                PositionScope::PerEventType => Some(event_type.to_string()),
                PositionScope::PerEntity => None,
            },
        }
    }
}

impl PositionStore for InMemoryPositionStore {
    fn get_position(
        &self,
        projection: &str,
        entity_id: &str,
        event_type: &str,
    ) -> Result<u64, PositionStoreError> {
        let positions = self.positions.read().map_err(|_| PositionStoreError::Poisoned)?;
        Ok(positions
            .get(&self.key(projection, entity_id, event_type))
            .copied()
            .unwrap_or(0))
    }

    fn update_position(
        &self,
        projection: &str,
        entity_id: &str,
        event_type: &str,
        position: u64,
    ) -> Result<(), PositionStoreError> {
        let key = self.key(projection, entity_id, event_type);
        let mut positions = self.positions.write().map_err(|_| PositionStoreError::Poisoned)?;
        positions.insert(key, position);
        Ok(())
    }
}
