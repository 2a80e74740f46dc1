// libs/health-log-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted symptom log with the insight text generated for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthLog {
    pub id: Uuid,
    pub patient_id: String,
    pub current_symptoms: String,
    #[serde(default)]
    pub medical_history: String,
    #[serde(default)]
    pub notes: String,
    pub generated_insights: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSymptomsRequest {
    pub patient_id: String,
    pub current_symptoms: String,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousLogSummary {
    pub symptoms: String,
    pub date: DateTime<Utc>,
    pub insights: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomInsightResponse {
    pub insights: String,
    pub previous_logs: Vec<PreviousLogSummary>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HealthLogError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insight provider error: {0}")]
    Upstream(String),

    #[error("Store error: {0}")]
    StoreUnavailable(String),
}
