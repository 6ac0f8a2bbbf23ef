//! Concurrent storage of the latest known state per entity.
//!
//! [`EntityRegistry`] keeps exactly one record per [`Username`]. Every write
//! is a whole-record replacement under the registry's own write lock, so
//! there is no read-modify-write window and the last completed upsert wins.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ConnectionId, Entity, Username};

/// Stored record: the entity plus server-side metadata.
#[derive(Debug, Clone)]
pub struct EntityEntry {
    /// Latest accepted state.
    pub entity: Entity,
    /// Connection that submitted the latest state.
    pub source: ConnectionId,
    /// When the latest state was stored.
    pub updated_at: DateTime<Utc>,
}

/// Identity → latest state map shared by all connections.
///
/// Records are created on the first accepted update for a name and then
/// overwritten. Nothing removes them; a disconnected entity keeps its last
/// position.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: RwLock<HashMap<Username, EntityEntry>>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for `entity.username`.
    ///
    /// Returns the entity previously stored under that name, if any.
    pub async fn upsert(&self, entity: Entity, source: ConnectionId) -> Option<Entity> {
        let entry = EntityEntry {
            entity,
            source,
            updated_at: Utc::now(),
        };
        let mut map = self.entities.write().await;
        map.insert(entry.entity.username.clone(), entry)
            .map(|previous| previous.entity)
    }

    /// Returns the stored record for `username`.
    pub async fn get(&self, username: &Username) -> Option<EntityEntry> {
        self.entities.read().await.get(username).cloned()
    }

    /// Returns every stored entity, ordered by username.
    pub async fn snapshot(&self) -> Vec<Entity> {
        let map = self.entities.read().await;
        let mut entities: Vec<Entity> = map.values().map(|entry| entry.entity.clone()).collect();
        entities.sort_by(|a, b| a.username.cmp(&b.username));
        entities
    }

    /// Returns the number of stored entities.
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    /// Returns `true` if no entity has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }
}
