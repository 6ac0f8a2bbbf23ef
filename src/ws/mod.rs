//! WebSocket layer: upgrade handler, frame classification, and the
//! per-connection session.
//!
//! The endpoint at `/ws` accepts entity updates and pushes every accepted
//! update and disconnect notice back to all connected clients.

pub mod connection;
pub mod handler;
pub mod messages;
