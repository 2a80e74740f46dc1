use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::HealthLogError;

const PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Generative insight capability. One attempt per call, bounded by the
/// client deadline; the caller surfaces failures, nothing is retried.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn generate_insight(&self, prompt: &str) -> Result<String, HealthLogError>;
}

pub struct GeminiInsightProvider {
    client: Client,
    api_url: String,
    api_key: String,
}

impl GeminiInsightProvider {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()
            .expect("failed to build insight provider HTTP client");

        Self {
            client,
            api_url: config.insight_api_url.clone(),
            api_key: config.insight_api_key.clone(),
        }
    }

    pub fn with_endpoint(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl InsightProvider for GeminiInsightProvider {
    async fn generate_insight(&self, prompt: &str) -> Result<String, HealthLogError> {
        debug!("Requesting symptom insight from provider");

        let request_body = json!({
            "contents": [
                {
                    "parts": [
                        { "text": prompt }
                    ]
                }
            ]
        });

        let url = format!("{}?key={}", self.api_url, self.api_key);
        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| HealthLogError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Insight provider request failed ({}): {}", status, body);
            return Err(HealthLogError::Upstream(format!(
                "insight request failed with status {}",
                status
            )));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| HealthLogError::Upstream(e.to_string()))?;

        let text = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| HealthLogError::Upstream("invalid insight response format".to_string()))?;

        Ok(clean_insight_text(text))
    }
}

/// Strips markdown decoration and stray characters from the generated
/// text before it is stored or returned.
pub fn clean_insight_text(text: &str) -> String {
    let stripped = text
        .replace("```json", " ")
        .replace("```", " ")
        .replace("**", "")
        .replace('*', " ");

    let filtered: String = stripped
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || " .,:;!?()-\n".contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}
