//! Per-connection session.
//!
//! A session registers its handle, reads frames until the transport stops
//! delivering them, and then deregisters and announces the disconnect.
//! Reading is the only point where a session waits; a read failure, a
//! close frame, the end of the stream or the idle timeout are the only
//! ways out of the loop. Bad messages are logged and skipped.

use std::fmt::Display;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use super::messages::InboundFrame;
use crate::app_state::AppState;
use crate::domain::{ConnectionHandle, ConnectionId, Username};
use crate::service::RelayService;

/// Why a session's read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Peer sent a close frame.
    PeerClosed {
        /// Close code, if any.
        code: Option<u16>,
    },
    /// Inbound stream ended without a close frame.
    StreamEnded,
    /// Transport reported an error.
    ReadError(String),
    /// No frame arrived within the configured idle timeout.
    IdleTimeout,
}

/// What happened over the lifetime of one session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Connection the session ran for.
    pub connection: ConnectionId,
    /// Last username accepted from this connection.
    pub last_username: Option<Username>,
    /// Messages stored and broadcast.
    pub accepted: u64,
    /// Messages discarded as malformed or anonymous.
    pub rejected: u64,
    /// Why the read loop ended.
    pub end: SessionEnd,
}

/// Runs one accepted WebSocket until it closes.
///
/// Splits the socket, starts the writer task that drains the connection's
/// outbound queue into the sink, and runs [`run_session`] on the read half.
/// Once the session is over the writer gets `writer_drain` to flush before
/// it is aborted.
pub async fn run_connection(socket: WebSocket, remote: SocketAddr, state: AppState) {
    let (ws_tx, ws_rx) = socket.split();
    let (handle, outbound_rx) = ConnectionHandle::channel(remote, state.session.outbound_buffer);
    let id = handle.id();

    let mut writer = tokio::spawn(write_frames(ws_tx, outbound_rx, id));

    let summary = run_session(
        ws_rx,
        handle,
        &state.relay_service,
        state.session.idle_timeout,
    )
    .await;

    if tokio::time::timeout(state.session.writer_drain, &mut writer)
        .await
        .is_err()
    {
        writer.abort();
        tracing::debug!(connection = %id, "writer did not drain in time; aborted");
    }

    tracing::info!(
        connection = %id,
        remote = %remote,
        username = summary.last_username.as_ref().map(Username::as_str).unwrap_or_default(),
        accepted = summary.accepted,
        rejected = summary.rejected,
        end = ?summary.end,
        "connection closed"
    );
}

/// Registers `handle`, processes inbound frames, then deregisters and
/// broadcasts the disconnect notice.
///
/// `inbound` is dropped before the disconnect is announced, whichever way
/// the loop ended.
pub async fn run_session<S, E>(
    mut inbound: S,
    handle: ConnectionHandle,
    relay: &RelayService,
    idle_timeout: Option<Duration>,
) -> SessionSummary
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let id = handle.id();
    relay.register(handle.clone()).await;

    let mut summary = SessionSummary {
        connection: id,
        last_username: None,
        accepted: 0,
        rejected: 0,
        end: SessionEnd::StreamEnded,
    };
    let end = read_loop(&mut inbound, &handle, relay, idle_timeout, &mut summary).await;
    summary.end = end;
    drop(inbound);

    match &summary.end {
        SessionEnd::ReadError(e) => {
            tracing::warn!(connection = %id, remote = %handle.remote(), error = %e, "read failed");
        }
        SessionEnd::IdleTimeout => {
            tracing::info!(connection = %id, remote = %handle.remote(), "idle timeout");
        }
        SessionEnd::PeerClosed { .. } | SessionEnd::StreamEnded => {}
    }

    relay.deregister(id, summary.last_username.as_ref()).await;
    summary
}

async fn read_loop<S, E>(
    inbound: &mut S,
    handle: &ConnectionHandle,
    relay: &RelayService,
    idle_timeout: Option<Duration>,
    summary: &mut SessionSummary,
) -> SessionEnd
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        let next = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, inbound.next()).await {
                Ok(next) => next,
                Err(_) => return SessionEnd::IdleTimeout,
            },
            None => inbound.next().await,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => return SessionEnd::ReadError(e.to_string()),
            None => return SessionEnd::StreamEnded,
        };

        let payload = match InboundFrame::from(message) {
            InboundFrame::Payload(payload) => payload,
            InboundFrame::Control => continue,
            InboundFrame::Close { code, reason } => {
                tracing::debug!(connection = %handle.id(), ?code, %reason, "peer sent close");
                return SessionEnd::PeerClosed { code };
            }
        };

        match relay.apply_update(handle, &payload).await {
            Ok(entity) => {
                summary.accepted += 1;
                if summary.last_username.as_ref() != Some(&entity.username) {
                    tracing::info!(
                        connection = %handle.id(),
                        remote = %handle.remote(),
                        username = %entity.username,
                        "entity joined"
                    );
                    summary.last_username = Some(entity.username);
                }
            }
            Err(e) => {
                summary.rejected += 1;
                tracing::warn!(
                    connection = %handle.id(),
                    remote = %handle.remote(),
                    error = %e,
                    "discarding inbound message"
                );
            }
        }
    }
}

/// Forwards queued frames to the socket until the queue closes or a write
/// fails, then closes the sink.
async fn write_frames<W>(mut sink: W, mut outbound: mpsc::Receiver<Utf8Bytes>, id: ConnectionId)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(frame)).await {
            tracing::debug!(connection = %id, error = %e, "write failed; writer stopping");
            return;
        }
    }
    if let Err(e) = sink.close().await {
        tracing::trace!(connection = %id, error = %e, "close after drain failed");
    }
}
