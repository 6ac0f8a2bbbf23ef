//! # position-relay
//!
//! WebSocket relay that keeps every connected client up to date with the
//! latest position of every entity.
//!
//! Clients send `{"Username": .., "X": .., "Y": .., "Z": ..}`. Each accepted
//! update is stored in the entity registry and echoed to all connected
//! clients, the sender included. When a connection closes, the remaining
//! clients receive `{"action": "disconnect", "username": ..}`.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket /ws, HTTP /health)
//!     │
//!     ├── WS Handler + Session (ws/)
//!     ├── Health endpoint (api/)
//!     │
//!     ├── RelayService (service/)
//!     │
//!     ├── EntityRegistry ── identity → latest state (domain/)
//!     └── ConnectionSet ── live outbound queues, fanned out by Broadcaster
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::{RelayConfig, WS_PATH};
use crate::domain::{ConnectionSet, EntityRegistry};
use crate::service::RelayService;

/// Builds the shared state for a fresh, empty relay.
#[must_use]
pub fn build_state(config: &RelayConfig) -> AppState {
    let registry = Arc::new(EntityRegistry::new());
    let connections = Arc::new(ConnectionSet::new());
    AppState {
        relay_service: Arc::new(RelayService::new(registry, connections)),
        session: config.session_settings(),
    }
}

/// Builds the complete router: `/ws` plus the HTTP endpoints.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// WebSocket handler needs the peer address.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route(WS_PATH, get(ws::handler::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
