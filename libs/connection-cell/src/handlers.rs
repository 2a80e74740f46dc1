use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use shared_config::AppConfig;
use shared_database::DocumentStoreClient;
use shared_models::error::AppError;

use crate::services::{
    cache::{IdentityCache, DEFAULT_CACHE_CAPACITY},
    directory::{ConnectionDirectory, DocumentConnectionDirectory},
    gateway::{DeliveryGateway, HttpDeliveryGateway},
    lifecycle::ConnectionLifecycleService,
    router::MessageRouter,
};

/// Long-lived cell state. Built once at startup: the identity cache must
/// outlive individual requests.
pub struct ConnectionCellState {
    pub router: MessageRouter,
    pub lifecycle: ConnectionLifecycleService,
}

impl ConnectionCellState {
    pub fn from_config(config: &AppConfig) -> Self {
        let store = Arc::new(DocumentStoreClient::new(config));
        let directory: Arc<dyn ConnectionDirectory> =
            Arc::new(DocumentConnectionDirectory::new(store));
        let gateway: Arc<dyn DeliveryGateway> = Arc::new(HttpDeliveryGateway::new(config));
        let cache = Arc::new(IdentityCache::new(DEFAULT_CACHE_CAPACITY));

        Self::with_parts(directory, cache, gateway)
    }

    /// Assembles the cell from injected parts. Tests substitute in-memory
    /// fakes for the directory and gateway here.
    pub fn with_parts(
        directory: Arc<dyn ConnectionDirectory>,
        cache: Arc<IdentityCache>,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> Self {
        let router = MessageRouter::new(
            Arc::clone(&directory),
            Arc::clone(&cache),
            Arc::clone(&gateway),
        );
        let lifecycle = ConnectionLifecycleService::new(directory, cache);

        Self { router, lifecycle }
    }
}

pub async fn ws_connect(
    State(state): State<Arc<ConnectionCellState>>,
    Path(connection_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.lifecycle.on_connect(&connection_id).await?;

    Ok(Json(json!({
        "status": 200,
        "message": "Connected"
    })))
}

pub async fn ws_disconnect(
    State(state): State<Arc<ConnectionCellState>>,
    Path(connection_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.lifecycle.on_disconnect(&connection_id).await?;

    Ok(Json(json!({
        "status": 200,
        "message": "Disconnected"
    })))
}

/// Routes a raw inbound frame. The outcome is always a structured
/// payload, mirrored into the HTTP status.
pub async fn ws_message(
    State(state): State<Arc<ConnectionCellState>>,
    Path(connection_id): Path<String>,
    body: String,
) -> impl IntoResponse {
    let outcome = state.router.handle_frame(&connection_id, &body).await;

    let status =
        StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, Json(json!(outcome)))
}
