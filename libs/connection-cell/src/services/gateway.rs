use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The target transport session no longer exists on the gateway side.
    /// Callers must purge cache and directory entries for the connection.
    #[error("connection {0} is no longer live")]
    Stale(String),

    /// Generic delivery failure. Reported to the caller without cleanup;
    /// deliveries are never retried automatically.
    #[error("delivery to connection {0} failed: {1}")]
    Transport(String, String),
}

/// Pushes an out-of-band message to a specific live connection held by
/// the hosting WebSocket gateway.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    async fn post_to_connection(
        &self,
        connection_id: &str,
        payload: Value,
    ) -> Result<(), DeliveryError>;
}

/// Gateway push API client. A 410 from the push endpoint is the
/// distinguished stale-connection outcome.
pub struct HttpDeliveryGateway {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpDeliveryGateway {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.store_connect_timeout_secs))
            .timeout(Duration::from_secs(config.store_request_timeout_secs))
            .build()
            .expect("failed to build gateway HTTP client");

        Self {
            client,
            endpoint: config.gateway_endpoint.clone(),
            api_key: config.gateway_api_key.clone(),
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: String::new(),
        }
    }
}

#[async_trait]
impl DeliveryGateway for HttpDeliveryGateway {
    async fn post_to_connection(
        &self,
        connection_id: &str,
        payload: Value,
    ) -> Result<(), DeliveryError> {
        let url = format!("{}/connections/{}", self.endpoint, connection_id);
        debug!("Pushing payload to connection {}", connection_id);

        let mut req = self.client.post(&url).json(&payload);
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = req
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(connection_id.to_string(), e.to_string()))?;

        let status = response.status();
        if status == StatusCode::GONE {
            return Err(DeliveryError::Stale(connection_id.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gateway push to {} failed ({}): {}", connection_id, status, body);
            return Err(DeliveryError::Transport(
                connection_id.to_string(),
                format!("HTTP {}: {}", status, body),
            ));
        }

        Ok(())
    }
}
