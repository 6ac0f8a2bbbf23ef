//! Relay service: ties the registry, the connection set and the
//! broadcaster together.

use std::sync::Arc;

use crate::domain::{
    BroadcastReport, Broadcaster, ConnectionHandle, ConnectionId, ConnectionSet, Entity,
    EntityRegistry, RelayEvent, Username,
};
use crate::error::RelayError;

/// Orchestration layer used by every connection session.
///
/// Owns shared references to [`EntityRegistry`] and [`ConnectionSet`].
/// An accepted update follows: decode → validate → upsert (registry lock
/// only) → broadcast (connection-set lock only, released before delivery).
#[derive(Debug, Clone)]
pub struct RelayService {
    registry: Arc<EntityRegistry>,
    connections: Arc<ConnectionSet>,
    broadcaster: Broadcaster,
}

impl RelayService {
    /// Creates a new `RelayService`.
    #[must_use]
    pub fn new(registry: Arc<EntityRegistry>, connections: Arc<ConnectionSet>) -> Self {
        let broadcaster = Broadcaster::new(Arc::clone(&connections));
        Self {
            registry,
            connections,
            broadcaster,
        }
    }

    /// Returns a reference to the inner [`EntityRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    /// Returns a reference to the inner [`ConnectionSet`].
    #[must_use]
    pub fn connections(&self) -> &Arc<ConnectionSet> {
        &self.connections
    }

    /// Adds a freshly accepted connection to the broadcast set.
    ///
    /// Returns `false` if the handle was already registered.
    pub async fn register(&self, handle: ConnectionHandle) -> bool {
        let id = handle.id();
        let remote = handle.remote();
        let added = self.connections.add(handle).await;
        if added {
            tracing::info!(connection = %id, remote = %remote, "connection registered");
        } else {
            tracing::warn!(connection = %id, remote = %remote, "connection already registered");
        }
        added
    }

    /// Applies one inbound message from `handle`.
    ///
    /// On success the entity is stored and echoed to every registered
    /// connection, `handle` included.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Decode`] or [`RelayError::MissingUsername`];
    /// in both cases the registry is untouched and nothing is broadcast.
    pub async fn apply_update(
        &self,
        handle: &ConnectionHandle,
        payload: &[u8],
    ) -> Result<Entity, RelayError> {
        let entity = Entity::decode(payload)?;

        self.registry.upsert(entity.clone(), handle.id()).await;

        let report = self
            .broadcaster
            .broadcast(&RelayEvent::Update(entity.clone()))
            .await;
        tracing::debug!(
            connection = %handle.id(),
            username = %entity.username,
            delivered = report.delivered,
            failed = report.failed,
            "entity update relayed"
        );
        Ok(entity)
    }

    /// Removes `id` from the broadcast set and tells every remaining
    /// connection that it left.
    ///
    /// `last_username` is the last name the connection successfully
    /// submitted; without one the notice carries an empty username. The
    /// registry keeps the entity's last state.
    pub async fn deregister(
        &self,
        id: ConnectionId,
        last_username: Option<&Username>,
    ) -> BroadcastReport {
        if !self.connections.remove(id).await {
            tracing::debug!(connection = %id, "connection was not registered");
        }

        let username = last_username.map(Username::as_str).unwrap_or_default();
        self.broadcaster
            .broadcast(&RelayEvent::disconnect(username))
            .await
    }

    /// Returns the number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.len().await
    }

    /// Returns the number of known entities.
    pub async fn entity_count(&self) -> usize {
        self.registry.len().await
    }
}
