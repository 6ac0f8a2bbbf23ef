//! Concurrent set of live connections.
//!
//! [`ConnectionSet`] maps each [`ConnectionId`] to its [`ConnectionHandle`]
//! behind a [`tokio::sync::RwLock`]. Traversal copies the member list under
//! the lock and visits it after releasing, so a long fan-out never blocks
//! connections joining or leaving.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{ConnectionHandle, ConnectionId};

/// Members currently eligible to receive broadcasts.
///
/// A handle is a member from [`Self::add`] until [`Self::remove`]; each id
/// appears at most once.
#[derive(Debug, Default)]
pub struct ConnectionSet {
    members: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handle`. Returns `false` and leaves the set unchanged if its id
    /// is already a member.
    pub async fn add(&self, handle: ConnectionHandle) -> bool {
        let mut map = self.members.write().await;
        if map.contains_key(&handle.id()) {
            return false;
        }
        map.insert(handle.id(), handle);
        true
    }

    /// Removes the member with `id`. Returns `false` if it was not a member.
    pub async fn remove(&self, id: ConnectionId) -> bool {
        self.members.write().await.remove(&id).is_some()
    }

    /// Returns `true` if `id` is currently a member.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.members.read().await.contains_key(&id)
    }

    /// Copies the current members.
    pub async fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.members.read().await.values().cloned().collect()
    }

    /// Calls `visit` once for every member present when the call starts.
    ///
    /// The lock is released before the first visit; members added or
    /// removed meanwhile do not affect this traversal.
    pub async fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&ConnectionHandle),
    {
        for handle in &self.snapshot().await {
            visit(handle);
        }
    }

    /// Returns the number of members.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Returns `true` if there are no members.
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}
