//! Messages fanned out to connected clients.
//!
//! An update is sent in exactly the shape clients submit it. Notices carry
//! an `action` discriminator so clients can tell them apart from updates.

use serde::Serialize;

use super::Entity;

/// Server-originated notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Notice {
    /// A connection has closed.
    Disconnect {
        /// Last username the closed connection submitted; empty if it never
        /// submitted a valid update.
        username: String,
    },
}

/// Anything the broadcaster can deliver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelayEvent {
    /// `{"Username","X","Y","Z"}` echo of an accepted update.
    Update(Entity),
    /// `{"action": ..., ...}` notice.
    Notice(Notice),
}

impl RelayEvent {
    /// Builds the disconnect notice for `username`.
    #[must_use]
    pub fn disconnect(username: impl Into<String>) -> Self {
        Self::Notice(Notice::Disconnect {
            username: username.into(),
        })
    }

    /// Short label used in log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Update(_) => "update",
            Self::Notice(Notice::Disconnect { .. }) => "disconnect",
        }
    }
}

impl From<Entity> for RelayEvent {
    fn from(entity: Entity) -> Self {
        Self::Update(entity)
    }
}
