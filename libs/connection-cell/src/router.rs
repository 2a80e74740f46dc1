// libs/connection-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers::{self, ConnectionCellState};

/// Endpoints the hosting WebSocket gateway invokes per transport event.
pub fn connection_routes(state: Arc<ConnectionCellState>) -> Router {
    Router::new()
        .route("/connect/{connection_id}", post(handlers::ws_connect))
        .route("/disconnect/{connection_id}", post(handlers::ws_disconnect))
        .route("/message/{connection_id}", post(handlers::ws_message))
        .with_state(state)
}
