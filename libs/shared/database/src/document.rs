use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Errors surfaced by the document store client.
///
/// `Unavailable` is the distinguished condition callers in the router
/// treat as degraded rather than fatal: the store could not be reached
/// within the configured deadlines.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document store unreachable: {0}")]
    Unavailable(String),

    #[error("document store request failed ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("failed to decode store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Request { status: 409, .. })
    }
}

/// Narrow HTTP client for the shared document store.
///
/// Collections are addressed PostgREST-style: `/rest/v1/<collection>`
/// with `<field>=eq.<value>` filters. Connect and request deadlines are
/// enforced so a hung store cannot block a handler indefinitely.
pub struct DocumentStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DocumentStoreClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.store_connect_timeout_secs))
            .timeout(Duration::from_secs(config.store_request_timeout_secs))
            .build()
            .expect("failed to build document store HTTP client");

        Self {
            client,
            base_url: config.document_store_url.clone(),
            api_key: config.document_store_api_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making store request to {}", url);

        let mut headers = self.get_headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, error_text);

            return Err(StoreError::Request {
                status: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
