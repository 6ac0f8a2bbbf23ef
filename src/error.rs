//! Relay error types.
//!
//! [`RelayError`] is the central error type for the relay. Per-message
//! failures (decode, missing username) are recoverable and keep the
//! connection open; delivery failures are isolated to a single recipient.

use crate::domain::ConnectionId;

/// Server-side error enum.
///
/// # Categories
///
/// | Variant(s)                          | Scope          | Effect on connection |
/// |-------------------------------------|----------------|----------------------|
/// | `Decode`, `MissingUsername`         | one message    | keeps reading        |
/// | `OutboundFull`, `OutboundClosed`    | one recipient  | delivery skipped     |
/// | `Encode`                            | one broadcast  | nothing sent         |
/// | `InvalidConfig`                     | startup        | process exits        |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Inbound message body is not a valid entity update.
    #[error("malformed entity update: {0}")]
    Decode(#[from] serde_json::Error),

    /// Inbound entity update has no username or an empty one.
    #[error("entity update has an empty username")]
    MissingUsername,

    /// Recipient's outbound queue has no room for another frame.
    #[error("outbound queue of connection {0} is full")]
    OutboundFull(ConnectionId),

    /// Recipient's writer task has stopped.
    #[error("outbound channel of connection {0} is closed")]
    OutboundClosed(ConnectionId),

    /// Outbound message could not be serialized.
    #[error("failed to encode outbound message: {0}")]
    Encode(String),

    /// Environment variable holds a value that cannot be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig {
        /// Environment variable name.
        key: &'static str,
        /// Raw value that failed to parse.
        value: String,
    },
}

impl RelayError {
    /// Returns `true` when the connection that produced this error should
    /// keep reading.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::MissingUsername)
    }

    /// Returns `true` for failures to deliver a frame to one recipient.
    #[must_use]
    pub const fn is_delivery_failure(&self) -> bool {
        matches!(self, Self::OutboundFull(_) | Self::OutboundClosed(_))
    }
}
