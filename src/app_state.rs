//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::SessionSettings;
use crate::service::RelayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay service shared by every connection session.
    pub relay_service: Arc<RelayService>,
    /// Settings applied to each new session.
    pub session: SessionSettings,
}
