//! Classification of inbound WebSocket frames.

use axum::body::Bytes;
use axum::extract::ws::Message;

/// What the session should do with one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// JSON payload to decode as an entity update.
    Payload(Bytes),
    /// Control frame with nothing to process.
    Control,
    /// Peer sent a close frame.
    Close {
        /// Close code, if the peer supplied one.
        code: Option<u16>,
        /// Close reason, possibly empty.
        reason: String,
    },
}

impl From<Message> for InboundFrame {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(text) => Self::Payload(Bytes::copy_from_slice(text.as_str().as_bytes())),
            Message::Binary(bytes) => Self::Payload(bytes),
            Message::Ping(_) | Message::Pong(_) => Self::Control,
            Message::Close(frame) => match frame {
                Some(frame) => Self::Close {
                    code: Some(frame.code),
                    reason: frame.reason.as_str().to_string(),
                },
                None => Self::Close {
                    code: None,
                    reason: String::new(),
                },
            },
        }
    }
}
