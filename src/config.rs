//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The WebSocket endpoint path is fixed
//! at [`WS_PATH`].

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::RelayError;

/// Route clients connect to.
pub const WS_PATH: &str = "/ws";

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Frames that may queue per connection before deliveries to it fail.
    pub outbound_buffer: usize,

    /// Close a connection after this many seconds without an inbound
    /// frame (0 = never).
    pub idle_timeout_secs: u64,

    /// Milliseconds a closing connection's writer gets to flush.
    pub writer_drain_ms: u64,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if `LISTEN_ADDR` is set but
    /// cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse().map_err(|_| RelayError::InvalidConfig {
                key: "LISTEN_ADDR",
                value: raw,
            })?,
            Err(_) => defaults.listen_addr,
        };

        Ok(Self {
            listen_addr,
            outbound_buffer: parse_env("OUTBOUND_BUFFER", defaults.outbound_buffer),
            idle_timeout_secs: parse_env("IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            writer_drain_ms: parse_env("WRITER_DRAIN_MS", defaults.writer_drain_ms),
        })
    }

    /// Per-session settings derived from this configuration.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            outbound_buffer: self.outbound_buffer.max(1),
            idle_timeout: (self.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(self.idle_timeout_secs)),
            writer_drain: Duration::from_millis(self.writer_drain_ms),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            outbound_buffer: 256,
            idle_timeout_secs: 0,
            writer_drain_ms: 1_000,
        }
    }
}

/// Settings each connection session runs with.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Capacity of the connection's outbound queue.
    pub outbound_buffer: usize,
    /// Read idle timeout; `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Grace period for the writer task after the session ends.
    pub writer_drain: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        RelayConfig::default().session_settings()
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
