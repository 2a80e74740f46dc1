use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DocumentStoreClient;

use crate::models::{
    HealthLog, HealthLogError, LogSymptomsRequest, PreviousLogSummary, SymptomInsightResponse,
};
use crate::services::insight::{GeminiInsightProvider, InsightProvider};

const PROMPT_HISTORY_LIMIT: usize = 5;

#[async_trait]
pub trait HealthLogStore: Send + Sync {
    /// Most recent logs first.
    async fn recent_logs(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<HealthLog>, HealthLogError>;

    async fn insert_log(&self, log: &HealthLog) -> Result<(), HealthLogError>;

    async fn logs_for_patient(&self, patient_id: &str) -> Result<Vec<HealthLog>, HealthLogError>;
}

pub struct DocumentHealthLogStore {
    store: Arc<DocumentStoreClient>,
}

impl DocumentHealthLogStore {
    pub fn new(store: Arc<DocumentStoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthLogStore for DocumentHealthLogStore {
    async fn recent_logs(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<HealthLog>, HealthLogError> {
        let path = format!(
            "/rest/v1/health_logs?patientId=eq.{}&order=createdAt.desc&limit={}",
            patient_id, limit
        );
        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| HealthLogError::StoreUnavailable(e.to_string()))
    }

    async fn insert_log(&self, log: &HealthLog) -> Result<(), HealthLogError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let _: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/health_logs",
                Some(json!(log)),
                Some(headers),
            )
            .await
            .map_err(|e| HealthLogError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn logs_for_patient(&self, patient_id: &str) -> Result<Vec<HealthLog>, HealthLogError> {
        let path = format!(
            "/rest/v1/health_logs?patientId=eq.{}&order=createdAt.desc",
            patient_id
        );
        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| HealthLogError::StoreUnavailable(e.to_string()))
    }
}

/// Symptom logging with generated insights. The provider call is a
/// single attempt; on failure nothing is inserted.
pub struct HealthLogService {
    store: Arc<dyn HealthLogStore>,
    provider: Arc<dyn InsightProvider>,
}

impl HealthLogService {
    pub fn new(store: Arc<dyn HealthLogStore>, provider: Arc<dyn InsightProvider>) -> Self {
        Self { store, provider }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = Arc::new(DocumentStoreClient::new(config));
        Self::new(
            Arc::new(DocumentHealthLogStore::new(client)),
            Arc::new(GeminiInsightProvider::new(config)),
        )
    }

    pub async fn log_symptoms(
        &self,
        request: LogSymptomsRequest,
    ) -> Result<SymptomInsightResponse, HealthLogError> {
        if request.current_symptoms.trim().is_empty() {
            return Err(HealthLogError::ValidationError(
                "currentSymptoms is required".to_string(),
            ));
        }
        if request.patient_id.trim().is_empty() {
            return Err(HealthLogError::ValidationError(
                "patientId is required".to_string(),
            ));
        }

        let previous = self
            .store
            .recent_logs(&request.patient_id, PROMPT_HISTORY_LIMIT)
            .await?;

        let prompt = build_insight_prompt(&request, &previous);
        let insights = self.provider.generate_insight(&prompt).await?;

        let log = HealthLog {
            id: Uuid::new_v4(),
            patient_id: request.patient_id.clone(),
            current_symptoms: request.current_symptoms.clone(),
            medical_history: request.medical_history.clone().unwrap_or_default(),
            notes: request.notes.clone().unwrap_or_default(),
            generated_insights: insights.clone(),
            created_at: Utc::now(),
        };
        self.store.insert_log(&log).await?;

        info!("Health log {} recorded for patient {}", log.id, log.patient_id);

        Ok(SymptomInsightResponse {
            insights,
            previous_logs: previous
                .into_iter()
                .map(|log| PreviousLogSummary {
                    symptoms: log.current_symptoms,
                    date: log.created_at,
                    insights: log.generated_insights,
                })
                .collect(),
        })
    }

    pub async fn get_health_logs(&self, patient_id: &str) -> Result<Vec<HealthLog>, HealthLogError> {
        if patient_id.trim().is_empty() {
            return Err(HealthLogError::ValidationError(
                "patientId is required".to_string(),
            ));
        }

        self.store.logs_for_patient(patient_id).await
    }
}

fn build_insight_prompt(request: &LogSymptomsRequest, previous: &[HealthLog]) -> String {
    let history = request.medical_history.as_deref().unwrap_or("");
    let notes = request.notes.as_deref().unwrap_or("");

    let previous_section = if previous.is_empty() {
        "No previous symptoms recorded".to_string()
    } else {
        previous
            .iter()
            .map(|log| {
                format!(
                    "- {} ({})",
                    log.current_symptoms,
                    log.created_at.format("%Y-%m-%d")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a medical assistant. A user has reported the following symptoms:\n\n{}\n\n\
         And their medical history is:\n{}\n\nAdditional notes: {}\n\n\
         Previous symptoms (if any):\n{}\n\n\
         Based on this, provide the following:\n\
         1. Possible Conditions (short and likely)\n\
         2. Risk Level (if any, brief)\n\
         3. Suggestions (like dietary/lifestyle)\n\n\
         Please reply in JSON format with keys: possible_conditions, risk_level, suggestions.",
        request.current_symptoms, history, notes, previous_section
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_mentions_missing_history_explicitly() {
        let request = LogSymptomsRequest {
            patient_id: "PAT-1".to_string(),
            current_symptoms: "headache".to_string(),
            medical_history: None,
            notes: None,
        };

        let prompt = build_insight_prompt(&request, &[]);
        assert!(prompt.contains("headache"));
        assert!(prompt.contains("No previous symptoms recorded"));
    }
}
