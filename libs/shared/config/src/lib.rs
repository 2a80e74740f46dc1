use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub document_store_url: String,
    pub document_store_api_key: String,
    pub gateway_endpoint: String,
    pub gateway_api_key: String,
    pub insight_api_url: String,
    pub insight_api_key: String,
    pub store_connect_timeout_secs: u64,
    pub store_request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            document_store_url: env::var("DOCUMENT_STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("DOCUMENT_STORE_URL not set, using empty value");
                    String::new()
                }),
            document_store_api_key: env::var("DOCUMENT_STORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("DOCUMENT_STORE_API_KEY not set, using empty value");
                    String::new()
                }),
            gateway_endpoint: env::var("WEBSOCKET_GATEWAY_ENDPOINT")
                .unwrap_or_else(|_| {
                    warn!("WEBSOCKET_GATEWAY_ENDPOINT not set, using empty value");
                    String::new()
                }),
            gateway_api_key: env::var("WEBSOCKET_GATEWAY_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("WEBSOCKET_GATEWAY_API_KEY not set, using empty value");
                    String::new()
                }),
            insight_api_url: env::var("INSIGHT_API_URL")
                .unwrap_or_else(|_| {
                    warn!("INSIGHT_API_URL not set, using default");
                    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
                        .to_string()
                }),
            insight_api_key: env::var("INSIGHT_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("INSIGHT_API_KEY not set, using empty value");
                    String::new()
                }),
            store_connect_timeout_secs: env::var("STORE_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            store_request_timeout_secs: env::var("STORE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.document_store_url.is_empty() && !self.document_store_api_key.is_empty()
    }

    pub fn is_gateway_configured(&self) -> bool {
        !self.gateway_endpoint.is_empty()
    }

    pub fn is_insight_configured(&self) -> bool {
        !self.insight_api_url.is_empty() && !self.insight_api_key.is_empty()
    }
}
