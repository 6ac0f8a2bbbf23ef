//! Outbound half of a live connection.

use std::net::SocketAddr;

use axum::extract::ws::Utf8Bytes;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::ConnectionId;
use crate::error::RelayError;

/// Cloneable handle used to push text frames to one client.
///
/// Frames go into a bounded queue drained by the connection's writer task,
/// so sending never waits on the network. Clones share the queue; the
/// writer stops once every clone is dropped.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    remote: SocketAddr,
    tx: mpsc::Sender<Utf8Bytes>,
}

impl ConnectionHandle {
    /// Creates a handle with a fresh [`ConnectionId`] together with the
    /// receiving end of its outbound queue.
    #[must_use]
    pub fn channel(remote: SocketAddr, capacity: usize) -> (Self, mpsc::Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            remote,
            tx,
        };
        (handle, rx)
    }

    /// Returns the membership key of this connection.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the peer address reported by the transport.
    #[must_use]
    pub const fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Queues an already-encoded text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::OutboundFull`] when the queue is at capacity and
    /// [`RelayError::OutboundClosed`] when the writer task has stopped.
    pub fn send_text(&self, frame: Utf8Bytes) -> Result<(), RelayError> {
        self.tx.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => RelayError::OutboundFull(self.id),
            TrySendError::Closed(_) => RelayError::OutboundClosed(self.id),
        })
    }

    /// Encodes `value` as JSON and queues it.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Encode`] if serialization fails, otherwise the
    /// errors of [`Self::send_text`].
    pub fn send_json<T: Serialize>(&self, value: &T) -> Result<(), RelayError> {
        let json = serde_json::to_string(value).map_err(|e| RelayError::Encode(e.to_string()))?;
        self.send_text(Utf8Bytes::from(json))
    }
}
