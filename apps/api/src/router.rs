use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use connection_cell::handlers::ConnectionCellState;
use connection_cell::router::connection_routes;
use health_log_cell::router::health_log_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    // The connection cell keeps its identity cache for the process
    // lifetime, so its state is built once here.
    let connection_state = Arc::new(ConnectionCellState::from_config(&state));

    Router::new()
        .route("/", get(|| async { "Medinex API is running!" }))
        .nest("/ws", connection_routes(connection_state))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/health-logs", health_log_routes(state))
}
