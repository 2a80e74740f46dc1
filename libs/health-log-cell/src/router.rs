// libs/health-log-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn health_log_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::log_symptoms))
        .route("/{patient_id}", get(handlers::get_health_logs))
        .with_state(state)
}
