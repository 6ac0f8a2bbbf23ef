//! HTTP API layer: operational endpoints next to the WebSocket route.

pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the router with all plain HTTP endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new().merge(handlers::system::routes())
}
