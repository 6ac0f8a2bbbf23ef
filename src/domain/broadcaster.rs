//! Fan-out of relay events to every live connection.
//!
//! [`Broadcaster`] encodes an event once and queues the frame on every
//! member of the [`ConnectionSet`]. One recipient failing never stops
//! delivery to the rest, and never removes that recipient from the set;
//! the recipient's own read loop decides when it leaves.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;

use super::{ConnectionSet, RelayEvent};

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients the frame was queued for.
    pub delivered: usize,
    /// Recipients whose delivery failed.
    pub failed: usize,
}

impl BroadcastReport {
    /// Number of members visited.
    #[must_use]
    pub const fn recipients(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Delivers [`RelayEvent`]s to the members of a shared [`ConnectionSet`].
#[derive(Debug, Clone)]
pub struct Broadcaster {
    connections: Arc<ConnectionSet>,
}

impl Broadcaster {
    /// Creates a broadcaster over `connections`.
    #[must_use]
    pub fn new(connections: Arc<ConnectionSet>) -> Self {
        Self { connections }
    }

    /// Sends `event` to every member present when the call starts,
    /// including the connection that caused it.
    ///
    /// Failures are logged per recipient and counted in the report.
    pub async fn broadcast(&self, event: &RelayEvent) -> BroadcastReport {
        let frame = match serde_json::to_string(event) {
            Ok(json) => Utf8Bytes::from(json),
            Err(e) => {
                tracing::error!(kind = event.kind(), error = %e, "failed to encode broadcast");
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();
        self.connections
            .for_each(|handle| match handle.send_text(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) if e.is_delivery_failure() => {
                    report.failed += 1;
                    tracing::warn!(
                        kind = event.kind(),
                        connection = %handle.id(),
                        remote = %handle.remote(),
                        error = %e,
                        "broadcast delivery failed"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        kind = event.kind(),
                        connection = %handle.id(),
                        error = %e,
                        "unexpected broadcast error"
                    );
                }
            })
            .await;

        tracing::trace!(
            kind = event.kind(),
            delivered = report.delivered,
            failed = report.failed,
            "broadcast complete"
        );
        report
    }
}
