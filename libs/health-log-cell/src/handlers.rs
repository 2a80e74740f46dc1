use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{HealthLogError, LogSymptomsRequest};
use crate::services::log::HealthLogService;

fn map_health_log_error(e: HealthLogError) -> AppError {
    let message = e.to_string();
    match e {
        HealthLogError::ValidationError(_) => AppError::Validation(message),
        HealthLogError::Upstream(_) => AppError::Upstream(message),
        HealthLogError::StoreUnavailable(_) => AppError::StoreUnavailable(message),
    }
}

#[axum::debug_handler]
pub async fn log_symptoms(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LogSymptomsRequest>,
) -> Result<Json<Value>, AppError> {
    let service = HealthLogService::from_config(&config);

    let response = service
        .log_symptoms(request)
        .await
        .map_err(map_health_log_error)?;

    Ok(Json(json!({
        "status": 200,
        "insights": response.insights,
        "previousLogs": response.previous_logs
    })))
}

#[axum::debug_handler]
pub async fn get_health_logs(
    State(config): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = HealthLogService::from_config(&config);

    let logs = service
        .get_health_logs(&patient_id)
        .await
        .map_err(map_health_log_error)?;

    let message = if logs.is_empty() {
        "No health logs found for this patient"
    } else {
        "Health logs retrieved successfully"
    };

    Ok(Json(json!({
        "status": 200,
        "message": message,
        "healthLogs": logs
    })))
}
